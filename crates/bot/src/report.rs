//! 通知消息的排版：定时播报、波动告警与命令回复。

use chrono::{DateTime, Utc};
use kabu_core::common::Market;
use kabu_core::market::entity::Quote;
use kabu_core::notify::entity::{COLOR_FALL, COLOR_INFO, COLOR_RISE, Embed};

use crate::handler::CommandOutcome;

/// 为整数部分插入千分位分隔符
fn group_thousands(digits: &str) -> String {
    let (sign, body) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits),
    };
    let mut grouped = String::with_capacity(body.len() + body.len() / 3);
    for (i, ch) in body.chars().enumerate() {
        if i > 0 && (body.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}{}", sign, grouped)
}

/// # Summary
/// 按市场格式化价格。
///
/// # Logic
/// - `jp`: `¥` 前缀，取整并带千分位。
/// - `crypto`: `$` 前缀，取整并带千分位。
/// - 其他: `$` 前缀，保留两位小数。
pub fn format_price(price: f64, market: Market) -> String {
    match market {
        Market::Jp => format!("¥{}", group_thousands(&format!("{:.0}", price))),
        Market::Crypto => format!("${}", group_thousands(&format!("{:.0}", price))),
        _ => format!("${:.2}", price),
    }
}

/// 播报中各市场分组的标题
pub fn market_label(market: Market) -> &'static str {
    match market {
        Market::Jp => "🇯🇵 日本株・日本株インデックス",
        Market::Us => "🇺🇸 米国株・米国株インデックス",
        Market::Crypto => "₿ 暗号通貨",
        Market::Eu => "🇪🇺 欧州株",
        Market::Asia => "🌏 アジア株",
        Market::Ca => "🇨🇦 カナダ株",
        Market::Au => "🇦🇺 オーストラリア株",
        Market::Forex => "💱 為替",
    }
}

fn trend_icon(change_percent: f64) -> &'static str {
    if change_percent > 0.0 {
        "📈"
    } else if change_percent < 0.0 {
        "📉"
    } else {
        "➡️"
    }
}

fn quote_line(quote: &Quote) -> String {
    format!(
        "{} **{}**: {} ({:+.2}%)",
        trend_icon(quote.change_percent),
        quote.name,
        format_price(quote.price, quote.market),
        quote.change_percent
    )
}

/// # Summary
/// 生成定时播报消息。
///
/// # Logic
/// 1. 按 `Market::ALL` 的顺序分组，组内保持输入顺序。
/// 2. 没有报价的市场不生成字段。
///
/// # Returns
/// `quotes` 为空时返回 None，调用方不应发送任何消息。
pub fn regular_embed(quotes: &[Quote], now: DateTime<Utc>) -> Option<Embed> {
    if quotes.is_empty() {
        return None;
    }

    let mut embed = Embed::new("📊 株価定期更新", "定期的な株価情報をお知らせします", COLOR_INFO)
        .with_timestamp(now);

    for market in Market::ALL {
        let lines: Vec<String> = quotes
            .iter()
            .filter(|q| q.market == market)
            .map(quote_line)
            .collect();
        if !lines.is_empty() {
            embed = embed.field(market_label(market), lines.join("\n"), false);
        }
    }

    Some(embed)
}

/// # Summary
/// 生成单个标的的波动告警，上涨为绿色，下跌为红色。
pub fn alert_embed(quote: &Quote) -> Embed {
    let (direction, color) = if quote.change_percent > 0.0 {
        ("急上昇", COLOR_RISE)
    } else {
        ("急落", COLOR_FALL)
    };

    Embed::new(
        format!("🚨 {}アラート", direction),
        format!("**{} ({})**", quote.name, quote.symbol),
        color,
    )
    .with_timestamp(quote.observed_at)
    .field("現在価格", format_price(quote.price, quote.market), true)
    .field("変動額", format!("{:+.2}", quote.change), true)
    .field("変動率", format!("{:+.2}%", quote.change_percent), true)
}

/// 命令执行结果的回复消息
pub fn command_reply_embed(outcome: &CommandOutcome, now: DateTime<Utc>) -> Embed {
    match outcome {
        CommandOutcome::Added(instrument) => Embed::new(
            format!("Add Stock: {} ({})", instrument.symbol, instrument.name),
            format!(
                "{} を監視リストに追加しました ({})",
                instrument.symbol, instrument.market
            ),
            COLOR_RISE,
        ),
        CommandOutcome::AlreadyExists(symbol) => Embed::new(
            format!("Add Stock: {}", symbol),
            format!("{} は既に監視リストに存在します", symbol),
            COLOR_INFO,
        ),
        CommandOutcome::Removed(symbol) => Embed::new(
            format!("Remove Stock: {}", symbol),
            format!("{} を監視リストから削除しました", symbol),
            COLOR_FALL,
        ),
        CommandOutcome::NotFound(symbol) => Embed::new(
            format!("Remove Stock: {}", symbol),
            format!("{} は監視リストに存在しません", symbol),
            COLOR_INFO,
        ),
        CommandOutcome::Listed(instruments) => {
            let mut embed = Embed::new(
                "List Current Stocks",
                format!("監視銘柄: {} 件", instruments.len()),
                COLOR_INFO,
            );
            for market in Market::ALL {
                let lines: Vec<String> = instruments
                    .iter()
                    .filter(|i| i.market == market)
                    .map(|i| format!("{} ({})", i.symbol, i.name))
                    .collect();
                if !lines.is_empty() {
                    embed = embed.field(market_label(market), lines.join("\n"), false);
                }
            }
            embed
        }
        CommandOutcome::Cleared(count) => Embed::new(
            "Clear All Stocks",
            format!("{} 件の監視銘柄を削除しました", count),
            COLOR_FALL,
        ),
    }
    .with_timestamp(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use kabu_core::common::Instrument;

    fn quote(symbol: &str, market: Market, price: f64, change_percent: f64) -> Quote {
        Quote {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            market,
            price,
            change: price * change_percent / 100.0,
            change_percent,
            volume: 100,
            observed_at: Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(2_345.6, Market::Jp), "¥2,346");
        assert_eq!(format_price(38_123.0, Market::Jp), "¥38,123");
        assert_eq!(format_price(999.0, Market::Jp), "¥999");
        assert_eq!(format_price(104_250.4, Market::Crypto), "$104,250");
        assert_eq!(format_price(1_234_567.0, Market::Crypto), "$1,234,567");
        assert_eq!(format_price(189.5, Market::Us), "$189.50");
        assert_eq!(format_price(5_123.456, Market::Us), "$5123.46");
    }

    #[test]
    fn test_group_thousands_negative() {
        assert_eq!(group_thousands("-1234"), "-1,234");
        assert_eq!(group_thousands("0"), "0");
        assert_eq!(group_thousands("123456"), "123,456");
    }

    #[test]
    fn test_regular_embed_groups_in_market_order() {
        let now = Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap();
        let quotes = vec![
            quote("BTC-USD", Market::Crypto, 100_000.0, 1.0),
            quote("AAPL", Market::Us, 190.0, -0.5),
            quote("7203.T", Market::Jp, 3_000.0, 0.0),
            quote("6758.T", Market::Jp, 3_500.0, 2.0),
        ];

        let embed = regular_embed(&quotes, now).unwrap();
        assert_eq!(embed.color, COLOR_INFO);
        assert_eq!(embed.timestamp, now);
        let names: Vec<&str> = embed.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                market_label(Market::Jp),
                market_label(Market::Us),
                market_label(Market::Crypto)
            ]
        );
        assert_eq!(
            embed.fields[0].value,
            "➡️ **7203.T**: ¥3,000 (+0.00%)\n📈 **6758.T**: ¥3,500 (+2.00%)"
        );
        assert_eq!(embed.fields[1].value, "📉 **AAPL**: $190.00 (-0.50%)");
    }

    #[test]
    fn test_regular_embed_empty() {
        assert!(regular_embed(&[], Utc::now()).is_none());
    }

    #[test]
    fn test_alert_embed_color() {
        let rise = alert_embed(&quote("AAPL", Market::Us, 200.0, 6.0));
        assert_eq!(rise.color, COLOR_RISE);
        assert!(rise.title.contains("急上昇"));
        assert_eq!(rise.fields[0].value, "$200.00");
        assert_eq!(rise.fields[2].value, "+6.00%");

        let fall = alert_embed(&quote("TSLA", Market::Us, 100.0, -5.0));
        assert_eq!(fall.color, COLOR_FALL);
        assert!(fall.title.contains("急落"));
        assert_eq!(fall.fields[1].value, "-5.00");
    }

    #[test]
    fn test_command_reply_list() {
        let outcome = CommandOutcome::Listed(vec![
            Instrument::new("7203.T", "トヨタ", Market::Jp),
            Instrument::new("AAPL", "Apple", Market::Us),
        ]);
        let embed = command_reply_embed(&outcome, Utc::now());
        assert_eq!(embed.title, "List Current Stocks");
        assert_eq!(embed.fields.len(), 2);
        assert_eq!(embed.fields[1].value, "AAPL (Apple)");
    }
}
