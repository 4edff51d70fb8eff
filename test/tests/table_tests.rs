//! Table lifecycle: owner resets, expirations and liveness reports.

use anyhow::Result;
use cardroom_test::prelude::*;

fn heads_up_playing() -> Result<(TestWorld, TableId)> {
    let (mut world, table) = TestWorld::with_table(0)?;
    world.seat_player(ALICE, table, 500)?;
    world.seat_player(BOB, table, 500)?;
    start_hand(&mut world, table)?;
    Ok((world, table))
}

fn start_hand(world: &mut TestWorld, table: TableId) -> Result<()> {
    let data = initial_data(&[(ALICE, 500), (BOB, 500)], "dealer=alice");
    world.start_vote(TEST_OWNER, table, data.clone())?;
    world.start_vote(ALICE, table, data.clone())?;
    world.start_vote(BOB, table, data)?;
    world.next_block()?;
    assert!(world.table(table).is_playing());
    Ok(())
}

#[test]
fn test_owner_reset_keeps_seats() -> Result<()> {
    let (mut world, table) = heads_up_playing()?;
    // a result collector is open when the owner pulls the plug
    world.result_vote(TEST_OWNER, table, cancel_data("stuck"))?;
    assert!(world.store.collector(table).is_some());

    world.reset(table, false)?;

    let t = world.table(table);
    assert!(t.is_free());
    assert_eq!(t.cash.get(&world.player(ALICE)), Some(&500));
    assert_eq!(t.cash.get(&world.player(BOB)), Some(&500));
    assert_eq!(t.game_created, TIME_MIN);
    assert_eq!(t.game_expiration, TIME_MAX);
    assert!(world.store.collector(table).is_none());
    assert_eq!(
        world.ledger.count_events(|e| matches!(e, GameEvent::Rollback)),
        1
    );
    assert_eq!(
        world
            .ledger
            .count_events(|e| matches!(e, GameEvent::GameCashReturn { .. })),
        2
    );
    assert_eq!(world.ledger.balance(ALICE), 0);
    assert_eq!(world.total_supply(), 1_000);
    Ok(())
}

#[test]
fn test_owner_reset_clears_the_table() -> Result<()> {
    let (mut world, table) = heads_up_playing()?;
    world.reset(table, true)?;

    let t = world.table(table);
    assert!(t.cash.is_empty());
    assert!(t.playing_cash.is_empty());
    assert_eq!(world.ledger.balance(ALICE), 500);
    assert_eq!(world.ledger.balance(BOB), 500);
    assert_eq!(
        world
            .ledger
            .count_events(|e| matches!(e, GameEvent::BuyInReturn { .. })),
        2
    );
    assert_eq!(world.total_supply(), 1_000);
    Ok(())
}

#[test]
fn test_reset_requires_the_owner() -> Result<()> {
    let (mut world, table) = heads_up_playing()?;
    let op = GameReset {
        table_owner: ALICE,
        table,
        rollback_table: false,
    };
    assert_eq!(world.engine().game_reset(op), Err(Error::WrongTableOwner));
    assert!(world.table(table).is_playing());
    Ok(())
}

#[test]
fn test_reset_drops_parked_votes() -> Result<()> {
    let (mut world, table) = heads_up_playing()?;
    let result = result_data(&[(ALICE, 500, 0), (BOB, 500, 0)], "wash");
    assert_eq!(world.result_vote(ALICE, table, result.clone())?, VoteOutcome::Pending);
    assert_eq!(world.result_vote(BOB, table, result)?, VoteOutcome::Pending);

    world.reset(table, false)?;

    assert!(world.store.pending_votes.is_empty());
    assert_eq!(
        world.ledger.count_events(|e| matches!(e, GameEvent::FailVote { .. })),
        2
    );
    Ok(())
}

#[test]
fn test_game_lifetime_expiry_rolls_back() -> Result<()> {
    let (mut world, table) = TestWorld::with_table(0)?;
    world.params.game_lifetime_limit_in_seconds = 120;
    world.seat_player(ALICE, table, 500)?;
    world.seat_player(BOB, table, 500)?;
    start_hand(&mut world, table)?;

    world.advance(121)?;

    let t = world.table(table);
    assert!(t.is_free());
    assert_eq!(t.cash.get(&world.player(ALICE)), Some(&500));
    assert_eq!(
        world.ledger.count_events(|e| matches!(e, GameEvent::FailExpireLifetime)),
        1
    );
    assert_eq!(world.total_supply(), 1_000);
    Ok(())
}

#[test]
fn test_lifetime_defers_to_open_result_voting() -> Result<()> {
    let (mut world, table) = TestWorld::with_table(0)?;
    world.params.game_lifetime_limit_in_seconds = 120;
    world.seat_player(ALICE, table, 500)?;
    world.seat_player(BOB, table, 500)?;
    start_hand(&mut world, table)?;

    world.ledger.advance(115);
    let result = result_data(&[(ALICE, 1_000, 0), (BOB, 0, 0)], "bob busted");
    world.result_vote(TEST_OWNER, table, result.clone())?;
    // past the hand lifetime, but the open collector resolves the hand
    world.advance(10)?;
    assert!(world.table(table).is_playing());
    assert_eq!(
        world.ledger.count_events(|e| matches!(e, GameEvent::FailExpireLifetime)),
        0
    );

    world.result_vote(ALICE, table, result.clone())?;
    world.result_vote(BOB, table, result)?;
    world.next_block()?;
    assert!(world.table(table).is_free());
    assert_eq!(
        world
            .ledger
            .count_events(|e| matches!(e, GameEvent::ResultValidated { .. })),
        1
    );
    Ok(())
}

#[test]
fn test_start_vote_collector_expiry() -> Result<()> {
    let (mut world, table) = TestWorld::with_table(0)?;
    world.seat_player(ALICE, table, 500)?;
    world.seat_player(BOB, table, 500)?;
    world.start_vote(
        TEST_OWNER,
        table,
        initial_data(&[(ALICE, 500), (BOB, 500)], "dealer=alice"),
    )?;

    world.advance(world.params.voting_for_playing_expiration_seconds as u64 + 1)?;

    let t = world.table(table);
    assert!(t.is_free());
    assert_eq!(t.cash.get(&world.player(ALICE)), Some(&500));
    assert!(world.store.collector(table).is_none());
    assert_eq!(
        world.ledger.count_events(|e| matches!(e, GameEvent::FailExpireStart)),
        1
    );
    assert_eq!(world.total_supply(), 1_000);
    Ok(())
}

#[test]
fn test_result_vote_expiry_without_salvage() -> Result<()> {
    let (mut world, table) = heads_up_playing()?;
    // only the owner votes; zero effective player votes, no salvage
    world.result_vote(
        TEST_OWNER,
        table,
        result_data(&[(ALICE, 1_000, 0), (BOB, 0, 0)], "bob busted"),
    )?;
    world.advance(world.params.voting_for_results_expiration_seconds as u64 + 1)?;

    let t = world.table(table);
    assert!(t.is_free());
    assert_eq!(t.cash.get(&world.player(ALICE)), Some(&500));
    assert_eq!(t.cash.get(&world.player(BOB)), Some(&500));
    assert_eq!(
        world.ledger.count_events(|e| matches!(e, GameEvent::FailExpireResult)),
        1
    );
    assert_eq!(
        world
            .ledger
            .count_events(|e| matches!(e, GameEvent::ResultValidated { .. })),
        0
    );
    assert_eq!(world.total_supply(), 1_000);
    Ok(())
}

#[test]
fn test_tables_alive_returns_increasing_ids() -> Result<()> {
    let (mut world, first) = TestWorld::with_table(0)?;
    let second = world.add_table(0)?;

    let ids = world.tables_alive(&[first, second])?;
    assert_eq!(ids, vec![1, 2]);
    let ids = world.tables_alive(&[first])?;
    assert_eq!(ids, vec![3]);
    assert_eq!(world.table(first).last_alive, world.ledger.time);

    let op = TablesAlive {
        owner: ALICE,
        tables: [first].into_iter().collect(),
    };
    assert_eq!(world.engine().tables_alive(op), Err(Error::WrongTableOwner));
    Ok(())
}

#[test]
fn test_reset_also_reports_liveness() -> Result<()> {
    let (mut world, table) = heads_up_playing()?;
    let alive = world.reset(table, false)?;
    assert_eq!(alive, 1);
    assert_eq!(world.table(table).last_alive, world.ledger.time);
    Ok(())
}
