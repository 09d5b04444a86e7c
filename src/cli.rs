use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "food-scan")]
#[command(about = "食べ物の写真から子ども向けの栄養サマリーを表示するツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 写真を解析して結果を表示
    Scan {
        /// 画像のパス、file:// URI、http(s) URL、または data: URL
        #[arg(required = true)]
        image: String,

        /// 結果をJSONで出力
        #[arg(long)]
        json: bool,

        /// 推論エンドポイント（設定ファイルより優先）
        #[arg(long)]
        endpoint: Option<String>,

        /// 解析後に続けて別の写真をスキャン
        #[arg(short, long)]
        interactive: bool,
    },

    /// 設定を表示/編集
    Config {
        /// エンドポイントを設定
        #[arg(long)]
        set_endpoint: Option<String>,

        /// タイムアウト秒数を設定（0で無効）
        #[arg(long)]
        set_timeout: Option<u64>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },

    /// システムプロンプトを表示
    Prompt,
}
