mod settings;

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use kabu_bot::bot::StockBot;
use kabu_cache::mem::MemQuoteCache;
use kabu_core::common::{Market, sort_instruments};
use kabu_core::config::AppConfig;
use kabu_core::store::port::InstrumentStore;
use kabu_feed::yahoo::YahooProvider;
use kabu_market::fetcher::{FetcherConfig, QuoteFetcher};
use kabu_market::service::QuoteService;
use kabu_notify::webhook::WebhookNotifier;
use kabu_store::json::JsonInstrumentStore;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "kabu", version, about = "Quote watcher with webhook alerts")]
struct Cli {
    /// 配置文件路径，缺省时尝试 ./kabu.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// 执行一次定时播报后退出
    Once,
    /// 运行调度循环直到 Ctrl-C
    Run,
    /// 执行一条聊天命令，例如 "!add-stock AAPL Apple us"
    Command {
        text: String,
        #[arg(long, default_value = "cli")]
        user: String,
    },
    /// 按市场列出仓库中的标的
    List,
}

/// 初始化日志：控制台 + logs/kabu.log 按日滚动
fn init_tracing() -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily("logs", "kabu.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();

    guard
}

/// # Summary
/// 组装报价服务与机器人。
///
/// # Logic
/// 1. 校验配置 (Webhook、间隔、冷却窗口等)。
/// 2. 实例化基础设施层 (Yahoo 行情源、Webhook 通知器)。
/// 3. 以配置构造内存缓存与抓取器。
/// 4. 将全部依赖以 Arc<dyn Trait> 注入 StockBot。
fn build_bot(
    config: &AppConfig,
    store: Arc<JsonInstrumentStore>,
) -> Result<StockBot, Box<dyn Error>> {
    config.validate()?;
    let timeout = Duration::from_secs(config.quote.request_timeout_secs);

    let provider = Arc::new(YahooProvider::new(timeout)?);
    let notifier = Arc::new(WebhookNotifier::new(
        config.notification.webhook_url.clone(),
        timeout,
    )?);

    let ttl = chrono::Duration::seconds(
        i64::try_from(config.quote.cache_ttl_secs).unwrap_or(i64::MAX),
    );
    let cache = Arc::new(MemQuoteCache::new(ttl));
    let fetcher = QuoteFetcher::new(
        provider,
        FetcherConfig {
            max_retries: config.quote.max_retries,
            request_timeout: timeout,
            sessions: config.quote.history_sessions,
        },
    );

    Ok(StockBot::new(
        config.clone(),
        QuoteService::new(cache, fetcher),
        notifier,
        store,
    )?)
}

async fn print_instruments(store: &dyn InstrumentStore) {
    let mut instruments = store.load().await;
    sort_instruments(&mut instruments);
    let counts = store.count_by_market().await;

    println!("Tracked instruments: {}", instruments.len());
    for market in Market::ALL {
        let Some(count) = counts.get(&market) else {
            continue;
        };
        println!("[{}] {}", market, count);
        for instrument in instruments.iter().filter(|i| i.market == market) {
            println!("  {:<12} {}", instrument.symbol, instrument.name);
        }
    }
}

/// # Summary
/// 应用启动入口，纯粹的 DI 容器。
///
/// # Logic
/// 1. 初始化日志与 TLS 加密后端。
/// 2. 分层加载并校验配置。
/// 3. 打开标的仓库，按子命令组装并执行；`list` 只读仓库，不需要 Webhook。
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let _guard = init_tracing();

    if let Err(e) = dotenvy::dotenv() {
        debug!("No .env file loaded: {}", e);
    }
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("A TLS crypto provider was already installed");
    }

    let config = settings::load(cli.config.as_deref())?;
    let store = Arc::new(JsonInstrumentStore::new(&config.store.data_file)?);
    info!("Instrument store at {}", store.path().display());

    match cli.action {
        Action::List => print_instruments(store.as_ref()).await,
        Action::Once => {
            let bot = build_bot(&config, store)?;
            let included = bot.send_regular_update().await?;
            info!("Single update finished with {} quotes", included);
        }
        Action::Run => {
            let bot = build_bot(&config, store)?;
            info!("Kabu watcher starting...");
            bot.run(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("Failed to listen for Ctrl-C: {}", e);
                    std::future::pending::<()>().await;
                }
            })
            .await;
            info!("Shutdown signal received. Exiting...");
        }
        Action::Command { text, user } => {
            let bot = build_bot(&config, store)?;
            match bot.handle_command(&text, &user).await? {
                Some(outcome) => println!("{:?}", outcome),
                None => println!("Unrecognized command: {}", text),
            }
        }
    }

    Ok(())
}
