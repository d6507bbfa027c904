#[cfg(test)]
mod tests {
    use crate::ledger::{FixedRoyaltyOracle, MemoryCoinLedger, MemoryItemCustody};
    use crate::market::Market;
    use crate::types::{AccountId, ItemConfig, LimitOrder, Side};

    const ITEM: u64 = 7;
    const ALICE: AccountId = AccountId(1);
    const BOB: AccountId = AccountId(2);

    type TestMarket = Market<MemoryCoinLedger, MemoryItemCustody, FixedRoyaltyOracle>;

    fn setup() -> TestMarket {
        let market = Market::new(
            MemoryCoinLedger::new(),
            MemoryItemCustody::new(),
            FixedRoyaltyOracle::none(),
        );
        market
            .set_item_configs(
                &[ITEM],
                &[ItemConfig {
                    tick: 1,
                    min_quantity: 1,
                }],
            )
            .unwrap();
        market.coins().mint(ALICE, 10_000_000);
        market.coins().mint(BOB, 10_000_000);
        market.items().mint(ALICE, ITEM, 100_000);
        market.items().mint(BOB, ITEM, 100_000);
        market
    }

    fn bid(price: u64, quantity: u64) -> LimitOrder {
        LimitOrder {
            side: Side::Buy,
            item_id: ITEM,
            price,
            quantity,
        }
    }

    fn ask(price: u64, quantity: u64) -> LimitOrder {
        LimitOrder {
            side: Side::Sell,
            item_id: ITEM,
            price,
            quantity,
        }
    }

    #[test]
    fn empty_book_queries() {
        let market = setup();
        assert_eq!(market.highest_bid(ITEM), None);
        assert_eq!(market.lowest_ask(ITEM), None);
        assert_eq!(market.spread(ITEM), None);
        assert_eq!(market.mid_price(ITEM), None);
        assert!(market.all_orders_at_price(Side::Buy, ITEM, 100).is_empty());
        assert_eq!(market.node(Side::Buy, ITEM, 100), None);
    }

    #[test]
    fn best_prices_track_resting_orders() {
        let market = setup();
        market.limit_order(ALICE, bid(100, 10)).unwrap();
        market.limit_order(BOB, ask(101, 10)).unwrap();

        assert_eq!(market.highest_bid(ITEM), Some(100));
        assert_eq!(market.lowest_ask(ITEM), Some(101));
        assert_eq!(market.spread(ITEM), Some(1));
        assert_eq!(market.mid_price(ITEM), Some(100.5));
    }

    #[test]
    fn best_bid_is_highest_of_many() {
        let market = setup();
        market.limit_order(ALICE, bid(100, 10)).unwrap();
        market.limit_order(ALICE, bid(110, 5)).unwrap();
        market.limit_order(ALICE, bid(90, 15)).unwrap();
        assert_eq!(market.highest_bid(ITEM), Some(110));
    }

    #[test]
    fn best_ask_is_lowest_of_many() {
        let market = setup();
        market.limit_order(BOB, ask(105, 10)).unwrap();
        market.limit_order(BOB, ask(104, 5)).unwrap();
        market.limit_order(BOB, ask(106, 15)).unwrap();
        assert_eq!(market.lowest_ask(ITEM), Some(104));
    }

    #[test]
    fn orders_at_price_report_time_order_and_makers() {
        let market = setup();
        market.limit_order(ALICE, bid(100, 10)).unwrap();
        market.limit_order(BOB, bid(100, 20)).unwrap();
        market.limit_order(ALICE, bid(100, 30)).unwrap();

        let orders = market.all_orders_at_price(Side::Buy, ITEM, 100);
        assert_eq!(orders.len(), 3);
        assert_eq!(orders[0].maker, ALICE);
        assert_eq!(orders[1].maker, BOB);
        assert_eq!(orders[2].maker, ALICE);
        let quantities: Vec<u64> = orders.iter().map(|order| order.quantity).collect();
        assert_eq!(quantities, vec![10, 20, 30]);
        assert!(orders[0].order_id < orders[1].order_id);
        assert!(orders[1].order_id < orders[2].order_id);
    }

    #[test]
    fn node_exposes_tombstone_offset() {
        let market = setup();
        for _ in 0..6 {
            market.limit_order(ALICE, bid(100, 1)).unwrap();
        }
        let node = market.node(Side::Buy, ITEM, 100).unwrap();
        assert_eq!(node.price, 100);
        assert_eq!(node.tombstone_offset, 0);
        assert_eq!(node.segments, 2);

        // Selling 4 consumes the first segment; the node survives with its
        // offset advanced.
        market.limit_order(BOB, ask(100, 4)).unwrap();
        let node = market.node(Side::Buy, ITEM, 100).unwrap();
        assert_eq!(node.tombstone_offset, 1);
        assert_eq!(node.segments, 2);
    }

    #[test]
    fn maker_of_tracks_resting_orders() {
        let market = setup();
        let result = market.limit_order(ALICE, bid(100, 10)).unwrap();
        let order_id = result.resting.unwrap().order_id;
        assert_eq!(market.maker_of(order_id), Some(ALICE));
    }

    #[test]
    fn snapshot_orders_both_sides_best_first() {
        let market = setup();
        market.limit_order(ALICE, bid(100, 10)).unwrap();
        market.limit_order(ALICE, bid(99, 5)).unwrap();
        market.limit_order(BOB, ask(102, 7)).unwrap();
        market.limit_order(BOB, ask(103, 3)).unwrap();

        let snapshot = market.snapshot(ITEM, 10).unwrap();
        assert_eq!(snapshot.best_bid(), Some((100, 10)));
        assert_eq!(snapshot.best_ask(), Some((102, 7)));
        assert_eq!(snapshot.spread(), Some(2));
        assert_eq!(snapshot.total_bid_quantity(), 15);
        assert_eq!(snapshot.total_ask_quantity(), 10);

        let depth_one = market.snapshot(ITEM, 1).unwrap();
        assert_eq!(depth_one.bids.len(), 1);
        assert_eq!(depth_one.asks.len(), 1);
    }

    #[test]
    fn snapshot_serde_round_trip() {
        let market = setup();
        market.limit_order(ALICE, bid(100, 10)).unwrap();
        market.limit_order(BOB, ask(105, 4)).unwrap();

        let snapshot = market.snapshot(ITEM, 10).unwrap();
        let json = serde_json::to_string(&snapshot).unwrap();
        let restored: crate::market::BookSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, snapshot);
    }

    #[test]
    fn snapshot_of_unknown_item_is_none() {
        let market = setup();
        assert!(market.snapshot(999, 10).is_none());
    }
}
