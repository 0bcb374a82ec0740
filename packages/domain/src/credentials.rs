//! # 実行パラメータ
//!
//! 削除実行のたびにクライアントから受け取る値。プロセス内には保存しない。

define_required_string! {
    /// リモート API の統合トークン
    ///
    /// ログに出力されないよう `Debug` はマスクされ、`Display` は実装しない。
    pub struct ApiToken {
        label: "トークン",
        max_length: 512,
        secret: true,
    }
}

define_required_string! {
    /// アーカイブ対象のデータベース ID
    pub struct DatabaseId {
        label: "データベース ID",
        max_length: 128,
    }
}
