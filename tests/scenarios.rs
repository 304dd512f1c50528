//! End-to-end scenarios: telemetry ticks feeding the connectivity supervisor
//! through the shared hand-off, with fake hardware on both sides.

mod common;

use climate_node::logic::{SENSOR_ERROR_TEXT, Tick, boot_display, tick};
use climate_node::supervisor::{LinkState, Supervisor};
use climate_node::{Config, Error, Handoff};
use embassy_futures::block_on;

use common::{ClockDelay, RecordingBroker, ScreenLog, ScriptedSensor, StaticWifi};

#[test]
fn valid_reading_is_shown_and_published_as_two_points() {
    let config = Config::compiled();
    let handoff = Handoff::new();
    let mut sensor = ScriptedSensor::new(&[(24.5, 60.0)]);
    let mut screen = ScreenLog::default();
    let mut wifi = StaticWifi::new(true);
    let mut broker = RecordingBroker::default();
    let mut sup = Supervisor::new(&config);

    boot_display(&mut screen).expect("display boots");
    assert!(block_on(sup.associate(&mut wifi, &mut ClockDelay::default())));

    {
        let mut session = block_on(sup.step_offline(&mut wifi, &mut broker))
            .ok()
            .expect("broker accepts");
        handoff.set_broker_up(true);

        let ticked = tick(&mut sensor, &mut screen, &handoff);
        assert!(matches!(ticked, Tick::Queued(_)));
        assert!(block_on(sup.step_online(&mut session, &handoff)).is_some());
    }

    assert_eq!(
        screen.frame,
        vec!["Temperature:", "24.50 C", "Humidity:", "60.00 %"]
    );
    assert_eq!(
        broker.published,
        vec![("temperature".to_string(), 24.5), ("humidity".to_string(), 60.0)]
    );
}

#[test]
fn invalid_reading_shows_error_and_publishes_nothing() {
    let config = Config::compiled();
    let handoff = Handoff::new();
    let mut sensor = ScriptedSensor::new(&[(f32::NAN, 55.0)]);
    let mut screen = ScreenLog::default();
    let mut wifi = StaticWifi::new(true);
    let mut broker = RecordingBroker::default();
    let mut sup = Supervisor::new(&config);

    {
        let mut session = block_on(sup.step_offline(&mut wifi, &mut broker))
            .ok()
            .expect("broker accepts");
        handoff.set_broker_up(true);

        assert_eq!(tick(&mut sensor, &mut screen, &handoff), Tick::SensorFault);
        block_on(sup.step_online(&mut session, &handoff));
    }

    assert_eq!(screen.frame, vec![SENSOR_ERROR_TEXT]);
    assert!(broker.published.is_empty());
}

#[test]
fn readings_taken_while_broker_is_down_are_never_sent() {
    let config = Config::compiled();
    let handoff = Handoff::new();
    let mut sensor = ScriptedSensor::new(&[(21.0, 40.0), (21.5, 41.0)]);
    let mut screen = ScreenLog::default();
    let mut wifi = StaticWifi::new(true);
    let mut broker = RecordingBroker {
        refuse: true,
        ..Default::default()
    };
    let mut sup = Supervisor::new(&config);

    for _ in 0..2 {
        assert!(matches!(
            tick(&mut sensor, &mut screen, &handoff),
            Tick::Skipped(_)
        ));
        assert!(block_on(sup.step_offline(&mut wifi, &mut broker)).is_err());
    }

    // The display keeps updating regardless of the broker.
    assert_eq!(screen.frames, 2);
    assert_eq!(screen.frame[1], "21.50 C");

    // Once the broker comes back nothing from the offline period is pending.
    broker.refuse = false;
    {
        let mut session = block_on(sup.step_offline(&mut wifi, &mut broker))
            .ok()
            .expect("broker accepts");
        handoff.set_broker_up(true);
        block_on(sup.step_online(&mut session, &handoff));
    }
    assert!(broker.published.is_empty());
    assert_eq!(sup.state(), LinkState::Online);
}

#[test]
fn display_init_failure_is_reported_before_anything_else() {
    let mut screen = ScreenLog {
        fail_init: true,
        ..Default::default()
    };

    assert_eq!(boot_display(&mut screen), Err(Error::Display));
    assert!(!screen.initialized);
    assert_eq!(screen.frames, 0);
}

#[test]
fn startup_association_is_bounded_to_ten_seconds() {
    let config = Config::compiled();
    let mut wifi = StaticWifi::new(false);
    let mut delay = ClockDelay::default();
    let mut sup = Supervisor::new(&config);

    assert!(!block_on(sup.associate(&mut wifi, &mut delay)));
    assert_eq!(wifi.begun, 1);
    assert_eq!(delay.elapsed_ms, 10_000);
    assert_eq!(sup.state(), LinkState::Disconnected);
}

#[test]
fn network_outage_never_reaches_the_broker() {
    let config = Config::compiled();
    let mut wifi = StaticWifi::new(false);
    let mut broker = RecordingBroker::default();
    let mut sup = Supervisor::new(&config);
    let mut delay = ClockDelay::default();

    for _ in 0..10 {
        if let Err(wait) = block_on(sup.step_offline(&mut wifi, &mut broker)) {
            delay.elapsed_ms += wait.as_millis();
        }
    }

    assert_eq!(wifi.reconnects, 10);
    assert_eq!(delay.elapsed_ms, 20_000);
    assert_eq!(sup.state(), LinkState::Disconnected);
}
