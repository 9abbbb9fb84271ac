//! Frame-skip routing observed through the host and its GL context

mod common;

use common::*;
use host_core::gl::FramebufferTarget::{self, Default as OnScreen, Offscreen};
use host_n64::HostConfig;

fn config(skip_count: u32) -> HostConfig {
    HostConfig {
        skip_count,
        ..Default::default()
    }
}

fn loaded(skip_count: u32, presents_on: fn(u64) -> bool) -> ScriptedHost {
    let mut core = ScriptedCore::new();
    core.presents_on = presents_on;
    let mut host = scripted_host(config(skip_count), core);
    assert!(host.load_game(&cartridge_image("SKIP", b'E'), false, false, false));
    host
}

fn step(host: &mut ScriptedHost) -> (Option<FramebufferTarget>, u32) {
    host.step_frame();
    (host.gl().current_target, host.frame_skip().wait())
}

#[test]
fn test_budget_two_scenario() {
    let mut host = loaded(2, |frame| frame == 3);

    assert_eq!(step(&mut host), (Some(Offscreen), 1));
    assert_eq!(step(&mut host), (Some(Offscreen), 2));
    assert_eq!(step(&mut host), (Some(OnScreen), 0));
    assert_eq!(host.gl().swaps, 1, "frame 3 is presented");

    // Frame 3 drew, so frame 4 goes back off-screen without waiting
    assert_eq!(step(&mut host), (Some(Offscreen), 1));
    assert_eq!(host.gl().swaps, 1);
}

#[test]
fn test_toggles_only_at_budget_without_presents() {
    for budget in 1..=5u32 {
        let mut host = loaded(budget, |_| false);
        let mut skipping = host.frame_skip().is_skipping();
        let mut toggles = 0;

        for _ in 0..30 {
            let wait_before = host.frame_skip().wait();
            host.step_frame();
            if host.frame_skip().is_skipping() != skipping {
                assert_eq!(wait_before, budget);
                assert_eq!(host.frame_skip().wait(), 0);
                skipping = host.frame_skip().is_skipping();
                toggles += 1;
            }
            assert!(host.frame_skip().wait() <= budget);
        }

        assert_eq!(toggles, 1, "budget {}", budget);
        assert_eq!(host.gl().swaps, 0);
    }
}

#[test]
fn test_zero_budget_always_on_screen() {
    let mut host = loaded(0, |_| true);
    for _ in 0..8 {
        assert_eq!(step(&mut host), (Some(OnScreen), 0));
    }
    assert_eq!(host.gl().swaps, 8);
    assert_eq!(host.stats().skipped, 0);
}

#[test]
fn test_presenting_every_frame_halves_swaps() {
    let mut host = loaded(3, |_| true);
    for _ in 0..20 {
        host.step_frame();
    }
    assert_eq!(host.stats().presented, 10);
    assert_eq!(host.stats().skipped, 10);
    assert_eq!(host.gl().swaps, 10);
}

#[test]
fn test_external_swap_present() {
    let mut host = loaded(4, |_| false);
    host.step_frame();
    assert!(host.frame_skip().is_skipping());

    host.swap_present();
    assert_eq!(host.gl().swaps, 0);
    assert_eq!(host.stats().skipped, 1);
    assert!(host.frame_skip().drew());

    host.step_frame();
    assert!(!host.frame_skip().is_skipping());
    host.swap_present();
    assert_eq!(host.gl().swaps, 1);
}

#[test]
fn test_changing_budget_mid_session() {
    let mut host = loaded(2, |_| true);
    host.step_frame();
    assert_eq!(host.skip_count(), 2);

    host.set_skip_count(0);
    assert_eq!(host.skip_count(), 0);
    assert_eq!(step(&mut host), (Some(OnScreen), 0));

    host.set_skip_count(1);
    assert_eq!(step(&mut host), (Some(Offscreen), 1));
}
