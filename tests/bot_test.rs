mod common;

use anyhow::Result;
use common::{parse_ist, test_service};
use kharcha::bot::{self, MENU, SessionStore, USER_LIMIT_REPLY};
use kharcha::domain::ReportPeriod;

#[test]
fn test_expense_message_saves_and_confirms() -> Result<()> {
    let (service, _temp) = test_service()?;
    let mut sessions = SessionStore::new();
    let now = parse_ist("2026-01-15 10:00:00");

    let reply = bot::handle_message(&service, &mut sessions, "toni", Some(42), "200 food", now);
    assert_eq!(reply, "Saved ₹200.00 in 'food'.");

    let report = service.summarize_period("toni", ReportPeriod::Today, now);
    assert_eq!(report.grand_total, 20000);
    Ok(())
}

#[test]
fn test_decimal_amounts_and_spaced_categories() -> Result<()> {
    let (service, _temp) = test_service()?;
    let mut sessions = SessionStore::new();
    let now = parse_ist("2026-01-15 10:00:00");

    let reply = bot::handle_message(
        &service,
        &mut sessions,
        "toni",
        None,
        "99.50 Auto Rickshaw",
        now,
    );
    assert_eq!(reply, "Saved ₹99.50 in 'auto rickshaw'.");
    Ok(())
}

#[test]
fn test_unrecognized_text_shows_the_menu() -> Result<()> {
    let (service, _temp) = test_service()?;
    let mut sessions = SessionStore::new();
    let now = parse_ist("2026-01-15 10:00:00");

    let reply = bot::handle_message(&service, &mut sessions, "toni", None, "hello there", now);
    assert_eq!(reply, MENU);
    Ok(())
}

#[test]
fn test_menu_digits_only_count_after_a_fresh_offer() -> Result<()> {
    let (service, _temp) = test_service()?;
    let mut sessions = SessionStore::new();
    let now = parse_ist("2026-01-15 10:00:00");

    // a cold "1" is not a menu pick, it just earns the menu
    let reply = bot::handle_message(&service, &mut sessions, "toni", None, "1", now);
    assert_eq!(reply, MENU);

    // now the offer is fresh and the digit dispatches
    let reply = bot::handle_message(&service, &mut sessions, "toni", None, "1", now);
    assert!(reply.starts_with("Period: "));
    Ok(())
}

#[test]
fn test_reports_keep_the_menu_offer_fresh() -> Result<()> {
    let (service, _temp) = test_service()?;
    let mut sessions = SessionStore::new();
    let now = parse_ist("2026-01-15 10:00:00");

    bot::handle_message(&service, &mut sessions, "toni", None, "menu please", now);
    let first = bot::handle_message(&service, &mut sessions, "toni", None, "3", now);
    assert!(first.starts_with("Period: 2026-01-01 → 2026-01-31"));

    // a second digit right after still dispatches
    let second = bot::handle_message(&service, &mut sessions, "toni", None, "4", now);
    assert!(second.starts_with("Period: 2025-12-01 → 2025-12-31"));
    Ok(())
}

#[test]
fn test_stale_menu_offer_lapses() -> Result<()> {
    let (service, _temp) = test_service()?;
    let mut sessions = SessionStore::new();

    bot::handle_message(
        &service,
        &mut sessions,
        "toni",
        None,
        "anything",
        parse_ist("2026-01-15 10:00:00"),
    );
    // eleven minutes later the digit no longer dispatches
    let reply = bot::handle_message(
        &service,
        &mut sessions,
        "toni",
        None,
        "1",
        parse_ist("2026-01-15 10:11:00"),
    );
    assert_eq!(reply, MENU);
    Ok(())
}

#[test]
fn test_budget_status_from_the_menu() -> Result<()> {
    let (service, _temp) = test_service()?;
    let mut sessions = SessionStore::new();
    let now = parse_ist("2026-01-15 10:00:00");

    service.set_budget("toni", "food", 100000)?;
    bot::handle_message(&service, &mut sessions, "toni", None, "45.50 food", now);

    bot::handle_message(&service, &mut sessions, "toni", None, "menu", now);
    let reply = bot::handle_message(&service, &mut sessions, "toni", None, "5", now);
    assert_eq!(
        reply,
        "*Budget status (this month)*\n- food: ₹45.50 / ₹1000.00"
    );
    Ok(())
}

#[test]
fn test_wipe_requires_confirmation() -> Result<()> {
    let (service, _temp) = test_service()?;
    let mut sessions = SessionStore::new();
    let now = parse_ist("2026-01-15 10:00:00");

    bot::handle_message(&service, &mut sessions, "toni", None, "200 food", now);
    bot::handle_message(&service, &mut sessions, "toni", None, "menu", now);

    let prompt = bot::handle_message(&service, &mut sessions, "toni", None, "6", now);
    assert!(prompt.contains("delete ALL your data"));
    // data still present until the confirmation lands
    assert_eq!(
        service
            .summarize_period("toni", ReportPeriod::Today, now)
            .grand_total,
        20000
    );

    let reply = bot::handle_message(&service, &mut sessions, "toni", None, "yes", now);
    assert_eq!(reply, "All your data has been deleted.");
    assert!(
        service
            .summarize_period("toni", ReportPeriod::Today, now)
            .is_empty()
    );

    // the confirmation is spent; another yes just re-offers the menu
    let reply = bot::handle_message(&service, &mut sessions, "toni", None, "yes", now);
    assert_eq!(reply, MENU);
    Ok(())
}

#[test]
fn test_wipe_confirmation_expires() -> Result<()> {
    let (service, _temp) = test_service()?;
    let mut sessions = SessionStore::new();
    let t0 = parse_ist("2026-01-15 10:00:00");

    bot::handle_message(&service, &mut sessions, "toni", None, "200 food", t0);
    bot::handle_message(&service, &mut sessions, "toni", None, "menu", t0);
    bot::handle_message(&service, &mut sessions, "toni", None, "6", t0);

    // twenty minutes pass; the pending wipe has lapsed
    let late = parse_ist("2026-01-15 10:20:00");
    let reply = bot::handle_message(&service, &mut sessions, "toni", None, "yes", late);
    assert_eq!(reply, MENU);
    assert_eq!(
        service
            .summarize_period("toni", ReportPeriod::Today, late)
            .grand_total,
        20000
    );
    Ok(())
}

#[test]
fn test_sixth_user_is_turned_away() -> Result<()> {
    let (service, _temp) = test_service()?;
    let mut sessions = SessionStore::new();
    let now = parse_ist("2026-01-15 10:00:00");

    for i in 1..=5 {
        let reply = bot::handle_message(
            &service,
            &mut sessions,
            &format!("user_{}", i),
            Some(i),
            "10 chai",
            now,
        );
        assert!(reply.starts_with("Saved"));
    }
    let reply = bot::handle_message(&service, &mut sessions, "user_6", Some(6), "10 chai", now);
    assert_eq!(reply, USER_LIMIT_REPLY);
    Ok(())
}

#[test]
fn test_zero_amount_is_rejected_loudly() -> Result<()> {
    let (service, _temp) = test_service()?;
    let mut sessions = SessionStore::new();
    let now = parse_ist("2026-01-15 10:00:00");

    let reply = bot::handle_message(&service, &mut sessions, "toni", None, "0 food", now);
    assert_eq!(reply, "Invalid amount: 0.00");
    assert!(
        service
            .summarize_period("toni", ReportPeriod::Today, now)
            .is_empty()
    );
    Ok(())
}
