//! End-to-end voting scenarios: consensus, fraud, substitution,
//! salvage and the pending-vote queue.

use anyhow::Result;
use cardroom_test::prelude::*;

fn heads_up() -> Result<(TestWorld, TableId)> {
    let (mut world, table) = TestWorld::with_table(0)?;
    world.seat_player(ALICE, table, 500)?;
    world.seat_player(BOB, table, 500)?;
    Ok((world, table))
}

fn heads_up_start(world: &mut TestWorld, table: TableId) -> Result<()> {
    let data = initial_data(&[(ALICE, 500), (BOB, 500)], "dealer=alice");
    world.start_vote(TEST_OWNER, table, data.clone())?;
    world.start_vote(ALICE, table, data.clone())?;
    world.start_vote(BOB, table, data)?;
    world.next_block()?;
    assert!(world.table(table).is_playing());
    Ok(())
}

fn assert_seat_and_play_disjoint(world: &TestWorld, table: TableId) {
    let table = world.table(table);
    assert!(
        table.cash.keys().all(|p| !table.playing_cash.contains_key(p)),
        "a player holds both seated and in-hand cash"
    );
}

#[test]
fn test_happy_path_two_players_no_witnesses() -> Result<()> {
    let (mut world, table) = heads_up()?;
    assert_eq!(world.total_supply(), 1_000);

    heads_up_start(&mut world, table)?;
    let alice = world.player(ALICE);
    let bob = world.player(BOB);
    {
        let t = world.table(table);
        assert!(t.cash.is_empty());
        assert_eq!(t.playing_cash.get(&alice), Some(&500));
        assert_eq!(t.playing_cash.get(&bob), Some(&500));
    }
    assert_seat_and_play_disjoint(&world, table);

    let result = result_data(&[(ALICE, 745, 5), (BOB, 250, 0)], "alice wins");
    world.result_vote(TEST_OWNER, table, result.clone())?;
    world.result_vote(ALICE, table, result.clone())?;
    world.result_vote(BOB, table, result)?;
    world.next_block()?;

    let t = world.table(table);
    assert!(t.is_free());
    assert_eq!(t.cash.get(&alice), Some(&745));
    assert_eq!(t.cash.get(&bob), Some(&250));
    assert_eq!(t.game_created, TIME_MIN);
    assert_eq!(t.game_expiration, TIME_MAX);
    let room = world.store.room(t.room)?;
    assert_eq!(room.pending_rake, 5);
    let fees = &world.store.player(alice)?.pending_fees;
    assert_eq!(fees.len(), 1);
    assert_eq!(fees[0].rake, 5);

    assert_eq!(world.total_supply(), 1_000);
    assert_eq!(
        world
            .ledger
            .count_events(|e| matches!(e, GameEvent::StartPlayingValidated { .. })),
        1
    );
    assert_eq!(
        world
            .ledger
            .count_events(|e| matches!(e, GameEvent::ResultValidated { .. })),
        1
    );
    world.ledger.assert_increasing_event_ids();
    Ok(())
}

#[test]
fn test_single_fraud_start_voter() -> Result<()> {
    let (mut world, table) = heads_up()?;
    let honest = initial_data(&[(ALICE, 500), (BOB, 500)], "dealer=alice");
    let forged = initial_data(&[(ALICE, 500), (BOB, 500)], "dealer=bob");
    world.start_vote(TEST_OWNER, table, honest.clone())?;
    world.start_vote(ALICE, table, forged)?;
    world.start_vote(BOB, table, honest)?;
    world.next_block()?;

    assert!(world.table(table).is_playing());
    let frauds: Vec<_> = world
        .ledger
        .events
        .iter()
        .filter_map(|record| match &record.event {
            GameEvent::FraudStartCheck { account, fail_info, valid_info } => {
                Some((*account, fail_info.clone(), valid_info.clone()))
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        frauds,
        vec![(ALICE, "dealer=bob".to_string(), "dealer=alice".to_string())]
    );
    Ok(())
}

#[test]
fn test_no_consensus_at_start_leaves_table_untouched() -> Result<()> {
    let (mut world, table) = heads_up()?;
    for (voter, info) in [(TEST_OWNER, "a"), (ALICE, "b"), (BOB, "c")] {
        world.start_vote(voter, table, initial_data(&[(ALICE, 500), (BOB, 500)], info))?;
    }
    world.next_block()?;

    // three buckets of one: dissent is far above any sane threshold
    let t = world.table(table);
    assert!(t.is_free());
    assert_eq!(t.cash.get(&world.player(ALICE)), Some(&500));
    assert_eq!(t.cash.get(&world.player(BOB)), Some(&500));
    assert!(world.store.collector(table).is_none());
    assert_eq!(
        world.ledger.count_events(|e| matches!(e, GameEvent::FailConsensusStart)),
        1
    );
    assert_eq!(world.total_supply(), 1_000);
    Ok(())
}

#[test]
fn test_result_expiry_with_salvage() -> Result<()> {
    let (mut world, table) = TestWorld::with_table(0)?;
    let players = [ALICE, BOB, CAROL, DAVE, ERIN];
    for account in players {
        world.seat_player(account, table, 100)?;
    }
    let lineup: Vec<_> = players.iter().map(|&a| (a, 100)).collect();
    let start = initial_data(&lineup, "full ring");
    world.start_vote(TEST_OWNER, table, start.clone())?;
    for account in players {
        world.start_vote(account, table, start.clone())?;
    }
    world.next_block()?;
    assert!(world.table(table).is_playing());

    let result = result_data(
        &[
            (ALICE, 195, 5),
            (BOB, 100, 0),
            (CAROL, 100, 0),
            (DAVE, 50, 0),
            (ERIN, 50, 0),
        ],
        "alice takes it",
    );
    world.result_vote(TEST_OWNER, table, result.clone())?;
    world.result_vote(ALICE, table, result.clone())?;
    world.result_vote(BOB, table, result.clone())?;
    world.result_vote(CAROL, table, result)?;
    // Dave and Erin stay silent; the collector lapses
    world.advance(world.params.voting_for_results_expiration_seconds as u64 + 1)?;

    let t = world.table(table);
    assert!(t.is_free());
    assert_eq!(t.cash.get(&world.player(DAVE)), Some(&50));
    assert_eq!(t.cash.get(&world.player(ERIN)), Some(&50));
    assert_eq!(t.cash.get(&world.player(ALICE)), Some(&195));
    assert_eq!(
        world
            .ledger
            .count_events(|e| matches!(e, GameEvent::ResultValidated { .. })),
        1
    );
    assert_eq!(
        world.ledger.count_events(|e| matches!(e, GameEvent::FailExpireResult)),
        0
    );
    assert_eq!(world.total_supply(), 500);
    Ok(())
}

#[test]
fn test_witness_substitution_during_result_voting() -> Result<()> {
    let (mut world, table) = heads_up()?;
    world.add_witness(WATCHER_1)?;
    heads_up_start(&mut world, table)?;

    let result = result_data(&[(ALICE, 600, 0), (BOB, 400, 0)], "alice ahead");
    // a lone player vote has no collector to join yet
    assert_eq!(
        world.result_vote(ALICE, table, result.clone())?,
        VoteOutcome::Pending
    );
    // the witness opens the collector; the pending vote drains into it
    assert_eq!(
        world.result_vote(WATCHER_1, table, result)?,
        VoteOutcome::Collected
    );
    world.next_block()?;

    // one silent player, one witness, substitution quota of one
    let t = world.table(table);
    assert!(t.is_free());
    assert_eq!(t.cash.get(&world.player(ALICE)), Some(&600));
    assert_eq!(t.cash.get(&world.player(BOB)), Some(&400));
    Ok(())
}

#[test]
fn test_required_witness_gates_start_tally() -> Result<()> {
    let (mut world, table) = TestWorld::with_table(1)?;
    world.seat_player(ALICE, table, 500)?;
    world.seat_player(BOB, table, 500)?;
    world.add_witness(WATCHER_1)?;

    let data = initial_data(&[(ALICE, 500), (BOB, 500)], "dealer=alice");
    world.start_vote(TEST_OWNER, table, data.clone())?;
    world.start_vote(ALICE, table, data.clone())?;
    world.start_vote(BOB, table, data.clone())?;
    world.next_block()?;
    // every player voted but the witness quorum is one
    assert!(world.table(table).is_free());

    world.start_vote(WATCHER_1, table, data)?;
    world.next_block()?;
    assert!(world.table(table).is_playing());
    Ok(())
}

#[test]
fn test_witness_substitution_during_start_voting() -> Result<()> {
    let (mut world, table) = heads_up()?;
    world.add_witness(WATCHER_1)?;

    let data = initial_data(&[(ALICE, 500), (BOB, 500)], "dealer=alice");
    world.start_vote(TEST_OWNER, table, data.clone())?;
    world.start_vote(ALICE, table, data.clone())?;
    world.next_block()?;
    // Bob is silent and no witness has covered for him yet
    assert!(world.table(table).is_free());

    world.start_vote(WATCHER_1, table, data)?;
    world.next_block()?;
    assert!(world.table(table).is_playing());
    Ok(())
}

#[test]
fn test_fraud_witness_dropped_from_carried_set() -> Result<()> {
    let (mut world, table) = heads_up()?;
    world.add_witness(WATCHER_1)?;

    let honest = initial_data(&[(ALICE, 500), (BOB, 500)], "dealer=alice");
    let forged = initial_data(&[(ALICE, 500), (BOB, 500)], "dealer=watcher");
    world.start_vote(TEST_OWNER, table, honest.clone())?;
    world.start_vote(WATCHER_1, table, forged)?;
    world.start_vote(ALICE, table, honest.clone())?;
    world.start_vote(BOB, table, honest)?;
    world.next_block()?;

    // the dissenting witness is not carried into result voting
    let t = world.table(table);
    assert!(t.is_playing());
    assert!(t.voted_witnesses.is_empty());
    assert_eq!(
        world
            .ledger
            .count_events(|e| matches!(e, GameEvent::FraudStartCheck { account, .. } if *account == WATCHER_1)),
        1
    );
    Ok(())
}

#[test]
fn test_pending_vote_drains_into_collector() -> Result<()> {
    let (mut world, table) = heads_up()?;
    heads_up_start(&mut world, table)?;

    let result = result_data(&[(ALICE, 500, 0), (BOB, 500, 0)], "wash");
    assert_eq!(world.result_vote(ALICE, table, result.clone())?, VoteOutcome::Pending);
    assert_eq!(world.store.pending_votes.len(), 1);

    world.result_vote(TEST_OWNER, table, result.clone())?;
    assert!(world.store.pending_votes.is_empty());
    let collector = world.store.collector(table).expect("collector open");
    assert!(collector.has_vote(ALICE));
    assert!(collector.has_vote(TEST_OWNER));

    world.result_vote(BOB, table, result)?;
    world.next_block()?;
    assert!(world.table(table).is_free());
    Ok(())
}

#[test]
fn test_fraudulent_pending_vote_is_dropped_with_event() -> Result<()> {
    let (mut world, table) = heads_up()?;
    world.seat_player(CAROL, table, 300)?;

    // Carol proposes herself into the lineup before any collector exists
    let rogue = initial_data(&[(ALICE, 500), (BOB, 500), (CAROL, 300)], "three-way");
    assert_eq!(world.start_vote(CAROL, table, rogue)?, VoteOutcome::Pending);

    // the owner's proposal names only Alice and Bob
    let data = initial_data(&[(ALICE, 500), (BOB, 500)], "dealer=alice");
    world.start_vote(TEST_OWNER, table, data)?;

    assert!(world.store.pending_votes.is_empty());
    assert_eq!(
        world
            .ledger
            .count_events(|e| matches!(e, GameEvent::FailVote { voter } if *voter == CAROL)),
        1
    );
    let collector = world.store.collector(table).expect("collector open");
    assert!(!collector.has_vote(CAROL));
    Ok(())
}

#[test]
fn test_lineup_mismatch_against_owner_proposal() -> Result<()> {
    let (mut world, table) = heads_up()?;
    world.seat_player(CAROL, table, 300)?;

    world.start_vote(
        TEST_OWNER,
        table,
        initial_data(&[(ALICE, 500), (BOB, 500)], "dealer=alice"),
    )?;
    let widened = initial_data(&[(ALICE, 500), (BOB, 500), (CAROL, 300)], "dealer=alice");
    assert_eq!(
        world.start_vote(CAROL, table, widened),
        Err(Error::LineupMismatch)
    );
    let shifted = initial_data(&[(ALICE, 500), (CAROL, 300)], "dealer=alice");
    assert_eq!(
        world.start_vote(ALICE, table, shifted),
        Err(Error::LineupMismatch)
    );
    Ok(())
}

#[test]
fn test_duplicate_votes_rejected() -> Result<()> {
    let (mut world, table) = heads_up()?;
    let data = initial_data(&[(ALICE, 500), (BOB, 500)], "dealer=alice");
    world.start_vote(TEST_OWNER, table, data.clone())?;
    assert_eq!(
        world.start_vote(TEST_OWNER, table, data.clone()),
        Err(Error::DuplicatedVote)
    );

    world.start_vote(ALICE, table, data.clone())?;
    world.start_vote(BOB, table, data.clone())?;
    world.next_block()?;

    // a pending voter is also a voter: one entry per (table, voter)
    let result = result_data(&[(ALICE, 500, 0), (BOB, 500, 0)], "wash");
    world.result_vote(ALICE, table, result.clone())?;
    assert_eq!(
        world.result_vote(ALICE, table, result),
        Err(Error::DuplicatedVote)
    );
    Ok(())
}

#[test]
fn test_start_vote_field_validation() -> Result<()> {
    let (mut world, table) = heads_up()?;
    world.add_player(DAVE, 0)?;

    assert_eq!(
        world.start_vote(TEST_OWNER, table, initial_data(&[], "empty")),
        Err(Error::NotEnoughPlayers)
    );
    assert_eq!(
        world.start_vote(TEST_OWNER, table, initial_data(&[(ALICE, 500)], "solo")),
        Err(Error::NotEnoughPlayers)
    );
    assert_eq!(
        world.start_vote(
            TEST_OWNER,
            table,
            initial_data(&[(ALICE, 500), (BOB, 0)], "zero stake")
        ),
        Err(Error::InvalidAmount)
    );
    // more chips than the seat holds
    let alice = world.player(ALICE);
    assert_eq!(
        world.start_vote(
            TEST_OWNER,
            table,
            initial_data(&[(ALICE, 600), (BOB, 500)], "over")
        ),
        Err(Error::NotEnoughCash(alice))
    );
    // an account that is no player at all
    assert_eq!(
        world.start_vote(
            TEST_OWNER,
            table,
            initial_data(&[(ALICE, 500), (STRANGER, 500)], "ghost")
        ),
        Err(Error::PlayerNotFound(STRANGER))
    );
    // a player that is not seated here
    assert_eq!(
        world.start_vote(
            TEST_OWNER,
            table,
            initial_data(&[(ALICE, 500), (DAVE, 500)], "standing")
        ),
        Err(Error::PlayerNotSeated(DAVE))
    );
    Ok(())
}

#[test]
fn test_stranger_cannot_vote() -> Result<()> {
    let (mut world, table) = heads_up()?;
    let data = initial_data(&[(ALICE, 500), (BOB, 500)], "dealer=alice");
    assert_eq!(
        world.start_vote(STRANGER, table, data),
        Err(Error::InvalidVoter(STRANGER))
    );
    Ok(())
}

#[test]
fn test_result_vote_validation() -> Result<()> {
    let (mut world, table) = heads_up()?;
    heads_up_start(&mut world, table)?;

    assert_eq!(
        world.result_vote(
            TEST_OWNER,
            table,
            result_data(&[(ALICE, 700, 5), (BOB, 300, 0)], "off by five")
        ),
        Err(Error::ResultNotBalanced)
    );
    assert_eq!(
        world.result_vote(TEST_OWNER, table, result_data(&[(ALICE, 1_000, 0)], "solo")),
        Err(Error::LineupMismatch)
    );
    Ok(())
}

#[test]
fn test_vote_state_and_owner_checks() -> Result<()> {
    let (mut world, table) = heads_up()?;

    // a result-vote needs a running hand
    assert_eq!(
        world.result_vote(TEST_OWNER, table, cancel_data("early")),
        Err(Error::TableNotPlaying)
    );

    // wrong owner in the operation
    let op = StartPlayingCheck {
        voter: TEST_OWNER,
        table_owner: ALICE,
        table,
        initial_data: initial_data(&[(ALICE, 500), (BOB, 500)], "x"),
    };
    assert_eq!(world.engine().start_playing_check(op), Err(Error::WrongTableOwner));

    // unknown table
    assert_eq!(
        world.start_vote(
            TEST_OWNER,
            TableId(999),
            initial_data(&[(ALICE, 500), (BOB, 500)], "x")
        ),
        Err(Error::TableNotFound(TableId(999)))
    );

    heads_up_start(&mut world, table)?;
    // a start-vote needs a free table
    assert_eq!(
        world.start_vote(
            TEST_OWNER,
            table,
            initial_data(&[(ALICE, 500), (BOB, 500)], "again")
        ),
        Err(Error::TableNotFree)
    );
    Ok(())
}

#[test]
fn test_cancel_result_returns_chips_to_seats() -> Result<()> {
    let (mut world, table) = heads_up()?;
    heads_up_start(&mut world, table)?;

    let cancel = cancel_data("misdeal");
    world.result_vote(TEST_OWNER, table, cancel.clone())?;
    world.result_vote(ALICE, table, cancel.clone())?;
    world.result_vote(BOB, table, cancel)?;
    world.next_block()?;

    let t = world.table(table);
    assert!(t.is_free());
    assert_eq!(t.cash.get(&world.player(ALICE)), Some(&500));
    assert_eq!(t.cash.get(&world.player(BOB)), Some(&500));
    // chips went back to seats, not to accounts
    assert_eq!(world.ledger.balance(ALICE), 0);
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
    assert_eq!(world.total_supply(), 1_000);
    Ok(())
}

#[test]
fn test_no_consensus_at_result_rolls_the_game_back() -> Result<()> {
    let (mut world, table) = heads_up()?;
    heads_up_start(&mut world, table)?;

    for (voter, win) in [(TEST_OWNER, 600), (ALICE, 700), (BOB, 800)] {
        world.result_vote(
            voter,
            table,
            result_data(&[(ALICE, win, 0), (BOB, 1_000 - win, 0)], "split"),
        )?;
    }
    world.next_block()?;

    let t = world.table(table);
    assert!(t.is_free());
    assert_eq!(t.cash.get(&world.player(ALICE)), Some(&500));
    assert_eq!(
        world.ledger.count_events(|e| matches!(e, GameEvent::FailConsensusResult)),
        1
    );
    assert_eq!(world.total_supply(), 1_000);
    Ok(())
}
