use thiserror::Error;

#[derive(Error, Debug)]
pub enum InspectError {
    /// 面積ゼロ・読めない画像（解析パイプラインが返す唯一のエラー）
    #[error("無効な画像です: {0}")]
    InvalidImage(String),

    #[error("画像読み込みエラー: {0}")]
    ImageLoad(String),

    #[error("画像のダウンロードに失敗: {0}")]
    Download(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("画像が見つかりません: {0}")]
    NoImagesFound(String),

    #[error("設定エラー: {0}")]
    Config(String),

    #[error("APIキーが設定されていません。`fruit-inspect config --set-api-key YOUR_KEY` で設定してください")]
    MissingApiKey,

    /// AI判定APIへの接続・応答エラー（呼び出し側では None に変換される）
    #[error("AI判定APIが利用できません: {0}")]
    RemoteUnavailable(String),

    #[error("エクスポートエラー: {0}")]
    Export(String),

    #[error("解析タスクが異常終了しました: {0}")]
    Task(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] fruit_inspect_common::Error),
}

pub type Result<T> = std::result::Result<T, InspectError>;
