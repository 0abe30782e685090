use column_engine::{
    Command, ConfirmSpec, InputEvent, PopupBody, PopupKind, Session, SessionConfig,
    TriggerDescriptor, ViewportProfile, KEY_RESET,
};

fn session_with(
    profile: ViewportProfile,
    triggers: &[(&str, u32)],
    registered: &[&str],
    confirm: Option<ConfirmSpec>,
) -> Session {
    let descriptors = triggers
        .iter()
        .map(|(id, pos)| TriggerDescriptor::new(*id, *pos))
        .collect();
    let mut session =
        Session::new(SessionConfig::for_profile(profile), descriptors, confirm).unwrap();
    for id in registered {
        session.handle(InputEvent::RegisterContent {
            id: id.to_string(),
            html: format!("<p>{}</p>", id),
        });
    }
    session
}

fn desktop(triggers: &[(&str, u32)]) -> Session {
    let ids: Vec<&str> = triggers.iter().map(|(id, _)| *id).collect();
    session_with(ViewportProfile::Desktop, triggers, &ids, None)
}

fn active_source(session: &Session) -> Option<String> {
    session.active_popup().and_then(|p| p.source.clone())
}

fn scroll(session: &mut Session, y: f32) {
    session.handle(InputEvent::Scroll { y });
}

/// Close the open popup and let the fade finish.
fn close(session: &mut Session) {
    session.handle(InputEvent::CloseRequested);
    session.tick(300.0);
}

fn run_for(session: &mut Session, ms: f64, frame: f64) {
    let mut elapsed = 0.0;
    while elapsed < ms {
        session.tick(frame);
        elapsed += frame;
    }
}

#[test]
fn slow_scroll_then_close_then_next() {
    let mut s = desktop(&[("a", 100), ("b", 500)]);
    scroll(&mut s, 50.0);
    s.tick(200.0);
    scroll(&mut s, 120.0);
    assert_eq!(active_source(&s).as_deref(), Some("a"));
    assert!(!s.scheduler().registry().is_shown("b"));

    close(&mut s);
    assert!(s.active_popup().is_none());
    assert_eq!(s.scheduler().missed_len(), 0);

    scroll(&mut s, 520.0);
    assert_eq!(active_source(&s).as_deref(), Some("b"));
}

#[test]
fn one_big_jump_activates_first_and_queues_second() {
    let mut s = desktop(&[("a", 100), ("b", 500)]);
    scroll(&mut s, 600.0);
    assert_eq!(active_source(&s).as_deref(), Some("a"));
    assert_eq!(s.scheduler().missed().collect::<Vec<_>>(), vec!["b"]);

    close(&mut s);
    assert_eq!(active_source(&s).as_deref(), Some("b"));
    assert_eq!(s.scheduler().missed_len(), 0);
}

#[test]
fn fast_scroll_past_trigger_still_fires() {
    let mut s = desktop(&[("mid", 3000)]);
    scroll(&mut s, 1000.0);
    assert!(s.active_popup().is_none());
    s.tick(200.0);
    scroll(&mut s, 5000.0);
    assert_eq!(active_source(&s).as_deref(), Some("mid"));
}

#[test]
fn medium_steps_past_trigger_fire_exactly_once() {
    let mut s = desktop(&[("a", 1000)]);
    let tuning = s.config().tuning();
    let stops = [250.0, 550.0, 850.0, 1150.0, 1450.0, 1750.0, 2050.0];
    for pair in stops.windows(2) {
        let step = pair[1] - pair[0];
        assert!(step > tuning.zone_buffer * 2.0 && step < tuning.fast_scroll_threshold);
    }

    let mut rendered = 0;
    for y in stops {
        scroll(&mut s, y);
        if s.active_popup().is_some() {
            close(&mut s);
        }
        s.tick(150.0);
        rendered += s
            .drain_commands()
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    Command::RenderPopup {
                        body: PopupBody::Text { source_id, .. },
                        ..
                    } if source_id == "a"
                )
            })
            .count();
    }
    assert!(s.scheduler().registry().is_shown("a"));
    assert_eq!(rendered, 1);
}

#[test]
fn missing_targets_skipped_while_draining() {
    let mut s = session_with(
        ViewportProfile::Desktop,
        &[("x", 100), ("a", 500), ("b", 900)],
        &["x", "b"],
        None,
    );
    scroll(&mut s, 1000.0);
    assert_eq!(active_source(&s).as_deref(), Some("x"));
    assert_eq!(s.scheduler().missed().collect::<Vec<_>>(), vec!["a", "b"]);

    close(&mut s);
    assert_eq!(active_source(&s).as_deref(), Some("b"));
    assert!(s.scheduler().registry().is_shown("a"));
}

#[test]
fn throttled_burst_evaluates_final_position() {
    let mut s = desktop(&[("a", 2000)]);
    scroll(&mut s, 100.0);
    for y in [500.0, 1000.0, 1950.0] {
        s.tick(20.0);
        scroll(&mut s, y);
    }
    assert!(s.active_popup().is_none());

    s.tick(40.0);
    assert_eq!(active_source(&s).as_deref(), Some("a"));
}

#[test]
fn fullscreen_change_reconciles_within_band() {
    let mut s = desktop(&[("a", 2000), ("b", 9000)]);
    scroll(&mut s, 1200.0);
    assert!(s.active_popup().is_none());

    s.handle(InputEvent::FullscreenChanged { fullscreen: true });
    s.tick(299.0);
    assert!(s.active_popup().is_none());
    s.tick(1.0);
    assert_eq!(active_source(&s).as_deref(), Some("a"));
}

#[test]
fn fullscreen_change_falls_back_to_nearest() {
    let mut s = desktop(&[("far", 8000)]);
    scroll(&mut s, 4000.0);
    s.handle(InputEvent::FullscreenChanged { fullscreen: true });
    s.tick(300.0);
    assert_eq!(active_source(&s).as_deref(), Some("far"));
}

#[test]
fn repeated_fullscreen_report_is_ignored() {
    let mut s = desktop(&[("a", 2000)]);
    scroll(&mut s, 1200.0);
    s.handle(InputEvent::FullscreenChanged { fullscreen: false });
    s.tick(1000.0);
    assert!(s.active_popup().is_none());
}

#[test]
fn startup_sweep_catches_initial_position() {
    let mut s = desktop(&[("a", 1000)]);
    s.start(800.0);
    assert_eq!(s.position(), 800.0);
    s.tick(1499.0);
    assert!(s.active_popup().is_none());
    s.tick(1.0);
    assert_eq!(active_source(&s).as_deref(), Some("a"));
}

#[test]
fn reset_lets_passed_triggers_fire_again() {
    let mut s = desktop(&[("a", 1000)]);
    scroll(&mut s, 1000.0);
    close(&mut s);
    assert!(s.scheduler().registry().is_shown("a"));

    s.handle(InputEvent::KeyDown { key_code: KEY_RESET });
    assert!(!s.scheduler().registry().is_shown("a"));
    assert_eq!(s.milestone().last_fired(), 0);

    s.tick(100.0);
    scroll(&mut s, 1050.0);
    assert_eq!(active_source(&s).as_deref(), Some("a"));
}

#[test]
fn reset_closes_open_popup() {
    let mut s = desktop(&[("a", 1000), ("b", 1300)]);
    scroll(&mut s, 1400.0);
    assert_eq!(s.scheduler().missed_len(), 1);

    s.handle(InputEvent::Reset);
    assert!(!s.is_scroll_locked());
    s.tick(300.0);
    assert!(s.active_popup().is_none());
    assert_eq!(s.scheduler().missed_len(), 0);
}

#[test]
fn auto_scroll_yields_to_manual_input() {
    let mut s = session_with(ViewportProfile::Touch, &[], &[], None);
    s.handle(InputEvent::ContentHeight { height: 1_000_000.0 });
    s.start(0.0);

    run_for(&mut s, 3000.0, 100.0);
    assert!(s.driver().is_running());
    assert!(s.position() > 0.0);

    s.handle(InputEvent::TouchStart);
    let held = s.position();
    run_for(&mut s, 2900.0, 100.0);
    assert!(!s.driver().is_running());
    assert_eq!(s.position(), held);

    s.tick(100.0);
    assert!(s.driver().is_running());
    assert!(s.position() > held);
}

#[test]
fn auto_scroll_steps_are_echoed_not_manual() {
    let mut s = session_with(ViewportProfile::Touch, &[], &[], None);
    s.handle(InputEvent::ContentHeight { height: 1_000_000.0 });
    s.start(0.0);
    run_for(&mut s, 3100.0, 100.0);

    let y = s
        .drain_commands()
        .into_iter()
        .filter_map(|c| match c {
            Command::ScrollTo { y } => Some(y),
            _ => None,
        })
        .last()
        .unwrap();
    scroll(&mut s, y.round());
    assert!(s.driver().is_running());
}

#[test]
fn small_manual_scroll_after_echo_pauses_auto_scroll() {
    let mut s = session_with(ViewportProfile::Touch, &[], &[], None);
    s.handle(InputEvent::ContentHeight { height: 1_000_000.0 });
    s.start(0.0);
    run_for(&mut s, 3100.0, 100.0);

    let y = s
        .drain_commands()
        .into_iter()
        .filter_map(|c| match c {
            Command::ScrollTo { y } => Some(y),
            _ => None,
        })
        .last()
        .unwrap();
    scroll(&mut s, y);
    assert!(s.driver().is_running());

    // A nudge inside the echo tolerance is the user's, not ours
    scroll(&mut s, y + 3.0);
    assert!(!s.driver().is_running());
    assert_eq!(s.position(), y + 3.0);
}

#[test]
fn auto_scroll_stops_for_popup_and_resumes_after_close() {
    let mut s = session_with(ViewportProfile::Touch, &[("a", 20)], &["a"], None);
    s.handle(InputEvent::ContentHeight { height: 1_000_000.0 });
    s.start(0.0);
    run_for(&mut s, 3000.0, 100.0);
    assert_eq!(active_source(&s).as_deref(), Some("a"));
    assert!(!s.driver().is_running());

    close(&mut s);
    run_for(&mut s, 2900.0, 100.0);
    assert!(!s.driver().is_running());
    s.tick(100.0);
    assert!(s.driver().is_running());
}

#[test]
fn milestone_fires_once_per_band() {
    let mut s = desktop(&[]);
    scroll(&mut s, 190_000.0);
    assert_eq!(
        s.active_popup().map(|p| p.kind),
        Some(PopupKind::Milestone)
    );
    close(&mut s);

    scroll(&mut s, 190_500.0);
    assert!(s.active_popup().is_none());

    let milestones: Vec<u32> = s
        .drain_commands()
        .into_iter()
        .filter_map(|c| match c {
            Command::RenderPopup {
                body: PopupBody::Milestone { milestone_cm },
                ..
            } => Some(milestone_cm),
            _ => None,
        })
        .collect();
    assert_eq!(milestones, vec![5000]);
}

fn confirm_spec() -> ConfirmSpec {
    ConfirmSpec::new("Keep building?", "indexheart.html").with_buttons("Yes", "No")
}

#[test]
fn confirm_shows_once() {
    let mut s = session_with(ViewportProfile::Desktop, &[], &[], Some(confirm_spec()));
    scroll(&mut s, 185_000.0);
    assert_eq!(s.active_popup().map(|p| p.kind), Some(PopupKind::Confirm));
    assert!(s.confirm_shown());

    s.handle(InputEvent::ConfirmCancelled);
    s.tick(300.0);
    assert!(s.active_popup().is_none());

    scroll(&mut s, 185_100.0);
    assert!(s.active_popup().is_none());
    assert!(!s.commands().iter().any(|c| matches!(c, Command::Navigate { .. })));
}

#[test]
fn confirm_accept_navigates() {
    let mut s = session_with(ViewportProfile::Desktop, &[], &[], Some(confirm_spec()));
    scroll(&mut s, 185_000.0);
    s.drain_commands();

    s.handle(InputEvent::ConfirmAccepted);
    let commands = s.drain_commands();
    assert_eq!(commands[0], Command::PauseAudio);
    assert_eq!(
        commands[1],
        Command::Navigate {
            url: "indexheart.html".into()
        }
    );
}

#[test]
fn image_lightbox_once_per_image_and_only_when_idle() {
    let mut s = desktop(&[("a", 1000)]);
    let visible = |id: &str| InputEvent::ImageVisible {
        id: id.to_string(),
        src: "column3.png".into(),
        natural_width: 600.0,
        natural_height: 900.0,
    };

    scroll(&mut s, 1000.0);
    s.handle(visible("img-1"));
    assert_eq!(s.active_popup().map(|p| p.kind), Some(PopupKind::Text));

    close(&mut s);
    s.handle(visible("img-1"));
    assert_eq!(s.active_popup().map(|p| p.kind), Some(PopupKind::Image));

    close(&mut s);
    s.handle(visible("img-1"));
    assert!(s.active_popup().is_none());
}

#[test]
fn at_most_one_popup_on_screen() {
    let mut s = desktop(&[
        ("a", 300),
        ("b", 900),
        ("c", 1500),
        ("d", 2100),
        ("e", 2700),
    ]);
    s.handle(InputEvent::ContentHeight { height: 200_000.0 });

    let events = [
        InputEvent::Scroll { y: 2800.0 },
        InputEvent::ImageVisible {
            id: "img-1".into(),
            src: "column3.png".into(),
            natural_width: 500.0,
            natural_height: 500.0,
        },
        InputEvent::CloseRequested,
        InputEvent::FullscreenChanged { fullscreen: true },
        InputEvent::CloseRequested,
        InputEvent::Reset,
        InputEvent::Scroll { y: 900.0 },
        InputEvent::CloseRequested,
        InputEvent::Scroll { y: 2100.0 },
        InputEvent::FullscreenChanged { fullscreen: false },
        InputEvent::CloseRequested,
    ];

    let mut on_screen = Vec::new();
    for event in events {
        s.push_input(event);
        for _ in 0..4 {
            s.tick(100.0);
            for command in s.drain_commands() {
                match command {
                    Command::RenderPopup { handle, .. } => {
                        assert!(on_screen.is_empty(), "{:?} rendered over {:?}", handle, on_screen);
                        on_screen.push(handle);
                    }
                    Command::TeardownPopup { handle } => on_screen.retain(|h| *h != handle),
                    _ => {}
                }
            }
        }
    }
}
