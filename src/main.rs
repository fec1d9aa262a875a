use clap::Parser;
use fruit_inspect::{cli, config, display, error, export, image_loader, overlay, scanner};
use fruit_inspect::Inspector;
use cli::{Cli, Commands};
use config::Config;
use error::Result;
use fruit_inspect_common::compare;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "fruit_inspect=debug,fruit_inspect_common=debug"
    } else {
        "fruit_inspect=info,fruit_inspect_common=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = Config::load()?;

    match cli.command {
        Commands::Analyze { source, output, overlay: overlay_path, no_banner, offline } => {
            println!("🍎 fruit-inspect - 品質判定\n");

            // 1. 画像読み込み
            println!("[1/3] 画像を読み込み中...");
            let image = Arc::new(image_loader::load_source(&source, config.timeout_seconds).await?);
            println!("✔ {}x{} px\n", image.width(), image.height());

            // 2. 解析
            let inspector = Inspector::from_config(&config, offline)?;
            println!(
                "[2/3] 解析中...{}",
                if inspector.has_remote() { " (ローカル解析 + AI判定)" } else { " (ローカル解析のみ)" }
            );
            let result = inspector.inspect(Arc::clone(&image)).await?;
            println!("✔ 解析完了\n");
            println!("{}\n", display::format_result(&result));

            // 3. 出力
            println!("[3/3] 結果を保存中...");
            if let Some(path) = output {
                export::write_export(&result, &path)?;
                println!("✔ 結果を保存: {}", path.display());
            }
            if let Some(path) = overlay_path {
                let options = overlay::OverlayOptions {
                    banner: !no_banner,
                    ..Default::default()
                };
                let annotated = overlay::render_overlay(&image, &result, &config.detector, &options)?;
                export::save_overlay(&annotated, &path)?;
                println!("✔ 注釈画像を保存: {}", path.display());
            }

            println!("\n✅ 完了");
        }

        Commands::Batch { folder, output, offline } => {
            println!("📸 fruit-inspect - 一括解析\n");

            // 1. 画像スキャン
            println!("[1/3] 写真をスキャン中...");
            let images = scanner::scan_folder(&folder)?;
            println!("✔ {}枚の写真を検出\n", images.len());

            if images.is_empty() {
                return Err(error::InspectError::NoImagesFound(folder.display().to_string()));
            }

            // 2. 解析
            println!("[2/3] 解析中...");
            let inspector = Inspector::from_config(&config, offline)?;
            let progress = ProgressBar::new(images.len() as u64);
            progress.set_style(
                ProgressStyle::with_template("{bar:40.green/white} {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );

            let mut entries = Vec::new();
            for info in &images {
                progress.set_message(info.file_name.clone());
                let loaded = image_loader::load_file(&info.path)
                    .map(Arc::new);
                let result = match loaded {
                    Ok(image) => inspector.inspect(image).await,
                    Err(e) => Err(e),
                };
                match result {
                    Ok(result) => entries.push(export::BatchEntry {
                        file_name: info.file_name.clone(),
                        result,
                    }),
                    Err(e) => {
                        progress.suspend(|| tracing::warn!("{} をスキップ: {}", info.file_name, e));
                    }
                }
                progress.inc(1);
            }
            progress.finish_and_clear();
            println!("✔ {}/{}枚を解析\n", entries.len(), images.len());

            // 3. 結果保存
            println!("[3/3] 結果を保存中...");
            let output = output.unwrap_or_else(|| folder.join("fruit-inspect.json"));
            export::write_batch(&entries, &output)?;
            println!("✔ 結果を保存: {}", output.display());

            println!("\n✅ 解析完了");
        }

        Commands::Compare { before, after, offline } => {
            println!("📊 fruit-inspect - 比較\n");

            let inspector = Inspector::from_config(&config, offline)?;

            println!("[1/2] 解析中...");
            let before_image = Arc::new(image_loader::load_source(&before, config.timeout_seconds).await?);
            let after_image = Arc::new(image_loader::load_source(&after, config.timeout_seconds).await?);
            let (before_result, after_result) = tokio::join!(
                inspector.inspect(before_image),
                inspector.inspect(after_image)
            );
            let (before_result, after_result) = (before_result?, after_result?);
            println!("✔ 解析完了\n");

            println!("[2/2] 比較結果");
            println!("{}", display::format_comparison(&compare(&before_result, &after_result)));
        }

        Commands::Config { set_api_key, show } => {
            let mut config = config;

            if let Some(key) = set_api_key {
                config.set_api_key(key)?;
                println!("✔ APIキーを設定しました");
            }

            if show {
                println!("設定:");
                println!("  モデル: {}", config.model);
                println!("  エンドポイント: {}", config.endpoint);
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  JPEG品質: {}", config.jpeg_quality);
                println!("  最大画像サイズ: {}px", config.max_image_size);
                println!(
                    "  APIキー: {}",
                    if config.get_api_key().is_ok() { "設定済み" } else { "未設定" }
                );
                println!("  検出パラメータ: {}", serde_json::to_string(&config.detector)?);
                println!("  統合パラメータ: {}", serde_json::to_string(&config.fusion)?);
            }
        }
    }

    Ok(())
}
