//! Integration test: ChannelPriceFeed <-> PaperOrderGateway
//!
//! Tests the demo wiring:
//! Price source -> Feed -> Paper gateway marks -> Market order fills

use chrono::Utc;
use rust_decimal_macros::dec;
use scalper_core::{Side, Tick};
use scalper_gateway::{ChannelPriceFeed, PaperGatewayConfig, PaperOrderGateway};
use scalper_ports::{OrderGateway, OrderRequest, PriceFeed};
use std::sync::Arc;
use std::time::Duration;

/// Wait until the gateway has seen `price` for `symbol`
async fn wait_for_mark(gateway: &PaperOrderGateway, symbol: &str, price: rust_decimal::Decimal) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while gateway.mark_price(symbol) != Some(price) {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("mark price never arrived");
}

#[tokio::test]
async fn test_gateway_fills_at_followed_price() {
    let _ = env_logger::builder().is_test(true).try_init();

    let feed = ChannelPriceFeed::default();
    let gateway = Arc::new(PaperOrderGateway::new(PaperGatewayConfig::default()));
    let follower = gateway.follow(feed.subscribe("ETHUSDT"));

    feed.publish(Tick::new("ETHUSDT", dec!(2000), Utc::now()));
    wait_for_mark(&gateway, "ETHUSDT", dec!(2000)).await;

    let ack = gateway
        .submit_market_order(&OrderRequest::market("buy-1", "ETHUSDT", Side::Buy, dec!(0.5)))
        .await
        .unwrap();
    assert_eq!(ack.avg_price, Some(dec!(2000)));

    feed.publish(Tick::new("ETHUSDT", dec!(2100), Utc::now()));
    wait_for_mark(&gateway, "ETHUSDT", dec!(2100)).await;

    let ack = gateway
        .submit_market_order(&OrderRequest::market("sell-1", "ETHUSDT", Side::Sell, dec!(0.5)))
        .await
        .unwrap();
    assert_eq!(ack.avg_price, Some(dec!(2100)));
    assert_eq!(gateway.balance("USDT").await, dec!(10050));

    follower.abort();
}

#[tokio::test]
async fn test_follower_releases_subscription_when_feed_closes() {
    let feed = ChannelPriceFeed::default();
    let gateway = Arc::new(PaperOrderGateway::new(PaperGatewayConfig::default()));
    let follower = gateway.follow(feed.subscribe("BTCUSDT"));
    assert_eq!(feed.subscriber_count("BTCUSDT"), 1);

    drop(feed);
    tokio::time::timeout(Duration::from_secs(1), follower)
        .await
        .expect("follower should end")
        .unwrap();
}

#[tokio::test]
async fn test_bots_share_a_symbol_stream() {
    let feed = ChannelPriceFeed::default();
    let mut bot_a = feed.subscribe("BTCUSDT");
    let mut bot_b = feed.subscribe("BTCUSDT");

    assert_eq!(feed.publish(Tick::new("BTCUSDT", dec!(100), Utc::now())), 2);
    assert_eq!(bot_a.recv().await.unwrap().price, dec!(100));
    assert_eq!(bot_b.recv().await.unwrap().price, dec!(100));

    bot_a.unsubscribe();
    feed.publish(Tick::new("BTCUSDT", dec!(99), Utc::now()));
    assert_eq!(bot_b.recv().await.unwrap().price, dec!(99));
}
