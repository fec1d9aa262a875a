use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fruit-inspect")]
#[command(about = "果物写真の品質判定ツール（ローカル画像解析 + AI判定）", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 1枚の写真を解析
    Analyze {
        /// 画像ファイルのパス、または http(s) URL
        #[arg(required = true)]
        source: String,

        /// 解析結果JSONの出力先
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 注釈画像の出力先（png/jpg）
        #[arg(long)]
        overlay: Option<PathBuf>,

        /// 注釈画像に判定帯を付けない
        #[arg(long)]
        no_banner: bool,

        /// AI判定を使わずローカル解析のみで判定
        #[arg(long)]
        offline: bool,
    },

    /// フォルダ内の写真を一括解析
    Batch {
        /// 写真フォルダのパス
        #[arg(required = true)]
        folder: PathBuf,

        /// 出力JSONファイル（デフォルト: 入力フォルダ/fruit-inspect.json）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// AI判定を使わずローカル解析のみで判定
        #[arg(long)]
        offline: bool,
    },

    /// 2枚の写真（保管前後など）を比較
    Compare {
        /// 比較元（前）
        #[arg(required = true)]
        before: String,

        /// 比較先（後）
        #[arg(required = true)]
        after: String,

        /// AI判定を使わずローカル解析のみで判定
        #[arg(long)]
        offline: bool,
    },

    /// 設定を表示/編集
    Config {
        /// APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
