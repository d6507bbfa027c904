//! End-to-end scenarios over the public interface: book shape, matching,
//! overflow and rejection behavior with literal values.

use itembook::{
    AccountId, FixedRoyaltyOracle, ItemConfig, LimitOrder, Market, MemoryCoinLedger,
    MemoryItemCustody, OrderLocation, Side,
};

const ITEM: u64 = 1;
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
    market.coins().mint(ALICE, 100_000_000);
    market.coins().mint(BOB, 100_000_000);
    market.items().mint(ALICE, ITEM, 1_000_000);
    market.items().mint(BOB, ITEM, 1_000_000);
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
fn resting_orders_define_best_prices() {
    let market = setup();
    market.limit_order(ALICE, bid(100, 10)).unwrap();
    market.limit_order(BOB, ask(101, 10)).unwrap();

    assert_eq!(market.highest_bid(ITEM), Some(100));
    assert_eq!(market.lowest_ask(ITEM), Some(101));
}

#[test]
fn partial_take_credits_maker_and_shrinks_slot() {
    let market = setup();
    let ask_id = market
        .limit_order(ALICE, ask(101, 10))
        .unwrap()
        .resting
        .unwrap()
        .order_id;

    let result = market.limit_order(BOB, bid(101, 3)).unwrap();
    assert_eq!(result.fills.len(), 1);
    assert_eq!(result.fills[0].quantity, 3);
    assert_eq!(market.coins_claimable(&[ask_id], false), vec![303]);

    let orders = market.all_orders_at_price(Side::Sell, ITEM, 101);
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].quantity, 7);
}

#[test]
fn cancel_in_the_middle_of_a_segment_left_shifts() {
    let market = setup();
    let mut ids = Vec::new();
    for _ in 0..4 {
        ids.push(
            market
                .limit_order(ALICE, bid(100, 1))
                .unwrap()
                .resting
                .unwrap()
                .order_id,
        );
    }

    market
        .cancel_orders(
            ALICE,
            &[ids[1]],
            &[OrderLocation {
                side: Side::Buy,
                item_id: ITEM,
                price: 100,
            }],
        )
        .unwrap();

    let remaining: Vec<_> = market
        .all_orders_at_price(Side::Buy, ITEM, 100)
        .iter()
        .map(|order| order.order_id)
        .collect();
    assert_eq!(remaining, vec![ids[0], ids[2], ids[3]]);
}

#[test]
fn consume_then_re_add_resets_the_level() {
    let market = setup();
    for _ in 0..4 {
        market.limit_order(ALICE, bid(100, 10)).unwrap();
    }

    let result = market.limit_order(BOB, ask(100, 40)).unwrap();
    assert!(result.is_complete());
    assert_eq!(market.highest_bid(ITEM), None);
    assert_eq!(market.node(Side::Buy, ITEM, 100), None);

    market.limit_order(ALICE, bid(100, 1)).unwrap();
    let node = market.node(Side::Buy, ITEM, 100).unwrap();
    assert_eq!(node.tombstone_offset, 0);
    assert_eq!(market.all_orders_at_price(Side::Buy, ITEM, 100).len(), 1);
}

#[test]
fn overflowing_a_full_level_walks_one_tick_down() {
    let market = setup();
    for _ in 0..100 {
        market.limit_order(ALICE, bid(100, 1)).unwrap();
    }

    let result = market.limit_order(ALICE, bid(100, 1)).unwrap();
    assert_eq!(result.resting.unwrap().price, 99);
    assert_eq!(market.all_orders_at_price(Side::Buy, ITEM, 100).len(), 100);
    assert_eq!(market.all_orders_at_price(Side::Buy, ITEM, 99).len(), 1);
}

#[test]
fn below_minimum_residual_is_signalled_and_dropped() {
    let market = setup();
    market
        .set_item_configs(
            &[ITEM],
            &[ItemConfig {
                tick: 1,
                min_quantity: 20,
            }],
        )
        .unwrap();

    let result = market.limit_order(ALICE, ask(100, 10)).unwrap();
    assert!(result.rejected_residual);
    assert!(result.resting.is_none());
    assert_eq!(market.lowest_ask(ITEM), None);
    assert_eq!(market.node(Side::Sell, ITEM, 100), None);
}

#[test]
fn emptying_identical_bids_removes_the_price() {
    let market = setup();
    for _ in 0..7 {
        market.limit_order(ALICE, bid(100, 10)).unwrap();
    }
    let counter_before = market.next_order_id();

    let result = market.limit_order(BOB, ask(100, 70)).unwrap();
    assert!(result.is_complete());
    assert_eq!(result.fills.len(), 7);
    assert_eq!(market.highest_bid(ITEM), None);
    assert_eq!(market.next_order_id(), counter_before);
}

#[test]
fn tombstoned_level_still_matches_and_cancels_correctly() {
    let market = setup();
    let mut ids = Vec::new();
    for _ in 0..8 {
        ids.push(
            market
                .limit_order(ALICE, ask(100, 1))
                .unwrap()
                .resting
                .unwrap()
                .order_id,
        );
    }

    // Consume the first segment: tombstone offset 1.
    market.limit_order(BOB, bid(100, 4)).unwrap();
    let node = market.node(Side::Sell, ITEM, 100).unwrap();
    assert_eq!(node.tombstone_offset, 1);

    // Queries skip the tombstoned segment.
    let remaining: Vec<_> = market
        .all_orders_at_price(Side::Sell, ITEM, 100)
        .iter()
        .map(|order| order.order_id)
        .collect();
    assert_eq!(remaining, ids[4..].to_vec());

    // Cancelling inside the surviving segment works.
    market
        .cancel_orders(
            ALICE,
            &[ids[5]],
            &[OrderLocation {
                side: Side::Sell,
                item_id: ITEM,
                price: 100,
            }],
        )
        .unwrap();
    let remaining: Vec<_> = market
        .all_orders_at_price(Side::Sell, ITEM, 100)
        .iter()
        .map(|order| order.order_id)
        .collect();
    assert_eq!(remaining, vec![ids[4], ids[6], ids[7]]);

    // And matching through the rest empties the level.
    market.limit_order(BOB, bid(100, 3)).unwrap();
    assert_eq!(market.lowest_ask(ITEM), None);
}

#[test]
fn independent_books_per_item() {
    let market = setup();
    market
        .set_item_configs(
            &[2],
            &[ItemConfig {
                tick: 1,
                min_quantity: 1,
            }],
        )
        .unwrap();
    market.items().mint(ALICE, 2, 1_000);

    market.limit_order(ALICE, bid(100, 5)).unwrap();
    market
        .limit_order(
            ALICE,
            LimitOrder {
                side: Side::Sell,
                item_id: 2,
                price: 100,
                quantity: 5,
            },
        )
        .unwrap();

    // The ask on item 2 does not cross the bid on item 1.
    assert_eq!(market.highest_bid(ITEM), Some(100));
    assert_eq!(market.lowest_ask(ITEM), None);
    assert_eq!(market.lowest_ask(2), Some(100));
    assert_eq!(market.highest_bid(2), None);
}

#[test]
fn limit_never_crosses_after_resting() {
    let market = setup();
    market.limit_order(ALICE, bid(100, 10)).unwrap();
    market.limit_order(BOB, ask(105, 10)).unwrap();

    // A buy at 104 rests; the book stays uncrossed.
    market.limit_order(BOB, bid(104, 5)).unwrap();
    let bid_price = market.highest_bid(ITEM).unwrap();
    let ask_price = market.lowest_ask(ITEM).unwrap();
    assert!(bid_price < ask_price);

    // A sell at 101 sweeps the crossing bids and rests the remainder.
    market.limit_order(ALICE, ask(101, 20)).unwrap();
    let bid_price = market.highest_bid(ITEM).unwrap();
    let ask_price = market.lowest_ask(ITEM).unwrap();
    assert!(bid_price < ask_price);
    assert_eq!(ask_price, 101);
}
