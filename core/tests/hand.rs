//! Hand and throw tests.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use fountain_core::{
    catalog::{ValuableCatalog, ValuableType},
    config::GenerationConfig,
    error::FountainError,
    generation::GenerationEngine,
    hand::Throwable,
    save_data::SaveData,
};

fn t0() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

fn blank_save() -> SaveData {
    SaveData::new_blank("bob", &ValuableCatalog::standard(), &GenerationConfig::default(), t0())
        .expect("blank save")
}

#[test]
fn throw_credits_the_whole_hand() {
    let mut save = blank_save();
    let now = t0() + TimeDelta::seconds(1);
    for value in [10.0, 20.0, 30.0] {
        save.hand_mut().add_to_hand(Throwable::new(ValuableType::Gem, value), now);
    }
    assert_eq!(save.hand().karma_in_hand(), 60.0);

    let outcome = save.throw(now);

    assert_eq!(outcome.karma_credited, 60.0);
    assert_eq!(outcome.thrown.len(), 3);
    assert_eq!(save.karma(), 60.0);
    assert!(save.hand().is_empty());
    assert_eq!(save.hand().last_throw_time, now);
}

#[test]
fn second_throw_credits_nothing() {
    let mut save = blank_save();
    save.hand_mut().add_to_hand(Throwable::new(ValuableType::Coin, 5.0), t0());
    save.throw(t0() + TimeDelta::seconds(1));

    let later = t0() + TimeDelta::seconds(2);
    let outcome = save.throw(later);

    assert_eq!(outcome.karma_credited, 0.0);
    assert!(outcome.thrown.is_empty());
    assert_eq!(save.karma(), 5.0);
    assert_eq!(save.hand().last_throw_time, later);
}

#[test]
fn throw_resets_session_counters() {
    let mut save = blank_save();
    let mut engine = GenerationEngine::new(ValuableCatalog::standard());

    let now = t0() + TimeDelta::seconds(3);
    engine.check_generate_all(&mut save, now).unwrap();
    assert_eq!(
        save.player_valuable(ValuableType::Coin).unwrap().generate_time_utilized(),
        TimeDelta::seconds(3)
    );

    save.throw(now);

    assert_eq!(save.karma(), 3.0);
    assert_eq!(save.out_of_game_time_since_last_throw(), TimeDelta::zero());
    for valuable in save.player_valuables().iter() {
        assert_eq!(valuable.generate_time_utilized(), TimeDelta::zero());
    }
}

#[test]
fn redeem_single_credits_once() {
    let mut save = blank_save();
    let keep = Throwable::new(ValuableType::Coin, 1.0);
    let redeem = Throwable::new(ValuableType::Fiduciary, 100.0);
    let redeem_id = redeem.id;
    save.hand_mut().add_to_hand(keep, t0());
    save.hand_mut().add_to_hand(redeem, t0());

    assert_eq!(save.redeem_single(redeem_id).unwrap(), 100.0);
    assert_eq!(save.karma(), 100.0);
    assert_eq!(save.hand().len(), 1);

    let err = save.redeem_single(redeem_id).unwrap_err();
    assert!(matches!(err, FountainError::ThrowableNotInHand { id } if id == redeem_id));
    assert_eq!(save.karma(), 100.0, "absent item must not credit");
}

#[test]
fn grab_adds_at_face_value() {
    let mut save = blank_save();
    let catalog = ValuableCatalog::standard();
    let at = t0() + TimeDelta::seconds(9);

    let id = save.grab(ValuableType::Gem, &catalog, at).unwrap();

    let grabbed = save.hand().get(id).expect("grabbed item in hand");
    assert_eq!(grabbed.valuable_type, ValuableType::Gem);
    assert_eq!(grabbed.throw_value, catalog.face_value(ValuableType::Gem).unwrap() as f64);
    assert_eq!(save.hand().last_grab_time, at);
}

#[test]
fn grouping_is_read_only() {
    let mut save = blank_save();
    for (valuable_type, value) in [
        (ValuableType::Coin, 1.0),
        (ValuableType::Gem, 10.0),
        (ValuableType::Coin, 1.0),
        (ValuableType::Coin, 2.0),
    ] {
        save.hand_mut().add_to_hand(Throwable::new(valuable_type, value), t0());
    }

    let groups = save.hand().grouped_throwables();
    assert_eq!(groups[&ValuableType::Coin].len(), 3);
    assert_eq!(groups[&ValuableType::Gem].len(), 1);
    assert!(!groups.contains_key(&ValuableType::Fiduciary));

    let counts = save.hand().valuable_type_counts();
    assert_eq!(counts[&ValuableType::Coin], 3);
    assert_eq!(save.hand().len(), 4, "grouping must not consume the hand");
}
