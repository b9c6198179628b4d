use anyhow::bail;
use chrono::{DateTime, Duration, TimeZone, Utc};
use keepalive::{
    allocation::HostOrder,
    engine::{EngineBuilder, EngineError, EngineSettings, EngineState, System, SystemContext},
    rng::SystemRng,
    scenario::Scenario,
    systems, World,
};

const SINGLE_REGION: &str = r#"
name: single_region
seed: 21
customers: 100
grid: { lat_divisions: 1, lng_divisions: 1 }
account_balance: 0
big_providers: []
candidate_sites: []
deployments:
  - { provider: home, quantity: 1 }
population:
  target_year: 2020
  samples:
    - { lng: 10.0, lat: 10.0, year: 2020, population: 1000, area: 1.0 }
"#;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
}

fn scenario(yaml: &str) -> Scenario {
    serde_yaml::from_str(yaml).expect("scenario parses")
}

fn build_engine(seed: u64) -> EngineBuilder {
    let settings = EngineSettings {
        scenario_name: "test".into(),
        seed,
    };
    systems::with_tick_systems(EngineBuilder::new(settings))
}

fn minutes_after_start(step: i64) -> DateTime<Utc> {
    start() + Duration::minutes(step)
}

#[test]
fn stopped_engine_refuses_to_tick() {
    let scenario = scenario(SINGLE_REGION);
    let mut world = scenario.build_world(start()).unwrap();
    let mut engine = build_engine(scenario.seed).build();

    assert_eq!(engine.state(), EngineState::Stopped);
    assert!(matches!(
        engine.tick(&mut world, start()),
        Err(EngineError::NotRunning)
    ));
    assert_eq!(world.tick(), 0);
}

#[test]
fn free_home_host_serves_single_region() {
    let scenario = scenario(SINGLE_REGION);
    let mut world = scenario.build_world(start()).unwrap();
    let mut engine = build_engine(scenario.seed).build();
    engine.start();

    for step in 0..24 {
        let report = engine
            .tick(&mut world, minutes_after_start(step * 60))
            .expect("tick succeeds");
        assert_eq!(report.hosts.len(), 1);
        let home = &report.hosts[0];
        assert_eq!(home.provider, "home");
        assert_eq!(home.cost, 0.0);
        assert_eq!(home.paid, home.cost);
        assert!(report.outages.is_empty());
        assert_eq!(report.account_balance, 0.0);
        assert!(report.active_customers >= 1, "home region keeps a customer");
        // feedback grows the base, so demand may outgrow the single unit
        assert!(report.served <= home.capacity);
        assert_eq!(report.served, report.active_customers.min(home.capacity));
        assert_eq!(report.served + report.unserved, report.active_customers);
        assert!(report.customers >= 0.0);
    }
    assert_eq!(world.tick(), 24);
}

#[test]
fn allocations_conserve_demand() {
    let loader = keepalive::ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"));
    let scenario = loader.load("scenarios/earth_small.yaml").unwrap();
    let mut world = scenario.build_world(start()).unwrap();
    let mut engine = build_engine(scenario.seed).build();

    let mut step = 0;
    engine
        .run_with_hook(
            &mut world,
            12,
            || {
                step += 7;
                minutes_after_start(step)
            },
            |_, report| {
                let allocated: u64 = report.records.iter().map(|r| r.count).sum();
                assert_eq!(allocated, report.active_customers);
                assert_eq!(report.served + report.unserved, report.active_customers);
                for record in &report.records {
                    if let Some(host) = record.host {
                        assert!(report.hosts[host].is_paid());
                    }
                }
            },
        )
        .unwrap();
    assert_eq!(world.tick(), 12);
    assert_eq!(engine.state(), EngineState::Stopped);
}

#[test]
fn unpaid_host_serves_nobody() {
    let mut scenario = scenario(SINGLE_REGION);
    scenario.account_balance = 10.0;
    scenario.host_order = HostOrder::FarthestFirst;
    scenario.big_providers = keepalive::provider::BigProvider::defaults();
    scenario
        .deployments
        .push(keepalive::provider::Deployment::new("dublin", 1));
    let mut world = scenario.build_world(start()).unwrap();
    let before = world.planet().customers();
    let mut engine = build_engine(scenario.seed).build();
    engine.start();

    let report = engine.tick(&mut world, minutes_after_start(30)).unwrap();
    let dublin = report
        .hosts
        .iter()
        .position(|h| h.provider == "dublin")
        .expect("dublin provisioned");
    assert_eq!(report.hosts[dublin].paid, 10.0);
    assert!(!report.hosts[dublin].is_paid());
    assert_eq!(report.outages, vec!["dublin".to_string()]);
    assert!(report.records.iter().all(|r| r.host != Some(dublin)));
    assert_eq!(report.served, 0);
    assert_eq!(report.unserved, report.active_customers);
    assert_eq!(report.account_balance, 0.0);
    assert!(world.planet().customers() < before);
}

#[test]
fn same_seed_same_history() {
    let scenario = scenario(SINGLE_REGION);
    let run = || {
        let mut world = scenario.build_world(start()).unwrap();
        let mut engine = build_engine(scenario.seed).build();
        let mut customers = Vec::new();
        let mut step = 0;
        engine
            .run_with_hook(
                &mut world,
                20,
                || {
                    step += 45;
                    minutes_after_start(step)
                },
                |_, report| customers.push((report.active_customers, report.customers)),
            )
            .unwrap();
        customers
    };
    assert_eq!(run(), run());
}

#[test]
fn hook_can_stop_the_engine() {
    let scenario = scenario(SINGLE_REGION);
    let mut world = scenario.build_world(start()).unwrap();
    let mut engine = build_engine(scenario.seed).build();

    let mut seen = Vec::new();
    engine
        .run_with_hook(&mut world, 10, start, |engine, report| {
            seen.push(report.tick);
            if report.tick == 3 {
                engine.stop();
            }
        })
        .unwrap();
    assert_eq!(seen, vec![1, 2, 3]);
    assert_eq!(world.tick(), 3);
}

struct FailingSystem;

impl System for FailingSystem {
    fn name(&self) -> &str {
        "failing"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        _world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> anyhow::Result<()> {
        bail!("disk on fire")
    }
}

#[test]
fn failed_tick_rolls_back() {
    let mut scenario = scenario(SINGLE_REGION);
    scenario.account_balance = 50.0;
    scenario.big_providers = keepalive::provider::BigProvider::defaults();
    scenario
        .deployments
        .push(keepalive::provider::Deployment::new("hong-kong", 1));
    let mut world = scenario.build_world(start()).unwrap();
    let customers_before: Vec<f64> = world
        .planet()
        .regions()
        .iter()
        .map(|r| r.customers)
        .collect();

    let mut engine = build_engine(scenario.seed).with_system(FailingSystem).build();
    engine.start();
    let result = engine.tick(&mut world, minutes_after_start(600));

    assert!(matches!(result, Err(EngineError::TickAborted { tick: 1, .. })));
    assert_eq!(world.tick(), 0);
    assert_eq!(world.account_balance(), 50.0);
    let customers_after: Vec<f64> = world
        .planet()
        .regions()
        .iter()
        .map(|r| r.customers)
        .collect();
    assert_eq!(customers_before, customers_after);
}

#[test]
fn huge_capacity_host_does_not_overflow() {
    let mut scenario = scenario(SINGLE_REGION);
    scenario.big_providers = vec![keepalive::provider::BigProvider {
        name: "huge".into(),
        lng: 0.0,
        lat: 0.0,
        capacity_per_unit: u64::MAX,
        price_per_unit: 0.0,
    }];
    scenario
        .deployments
        .push(keepalive::provider::Deployment::new("huge", 2));
    let mut world = scenario.build_world(start()).unwrap();
    let mut engine = build_engine(scenario.seed).build();
    engine.start();

    let report = engine.tick(&mut world, minutes_after_start(90)).unwrap();
    let huge = report.hosts.iter().find(|h| h.provider == "huge").unwrap();
    assert_eq!(huge.capacity, u64::MAX);
    assert_eq!(report.served, report.active_customers);
    assert_eq!(report.unserved, 0);
}

const WITH_CANDIDATE: &str = r#"
name: with_candidate
seed: 5
customers: 100
grid: { lat_divisions: 1, lng_divisions: 1 }
account_balance: 0
big_providers: []
candidate_sites:
  - { name: site-1, lng: 10.0, lat: 10.0 }
deployments:
  - { provider: home, quantity: 1 }
  - { provider: site-1, quantity: 2 }
population:
  target_year: 2020
  samples:
    - { lng: 0.0, lat: 0.0, year: 2020, population: 1000, area: 1.0 }
"#;

#[test]
fn world_can_be_adjusted_between_ticks() {
    let scenario = scenario(WITH_CANDIDATE);
    let mut world = scenario.build_world(start()).unwrap();
    let mut engine = build_engine(scenario.seed).build();
    engine.start();

    let report = engine.tick(&mut world, minutes_after_start(0)).unwrap();
    assert_eq!(report.hosts.len(), 1, "dormant candidate is not provisioned");

    world
        .catalog_mut()
        .get_mut("site-1")
        .expect("candidate in catalog")
        .active = true;
    let report = engine.tick(&mut world, minutes_after_start(60)).unwrap();
    assert_eq!(report.hosts.len(), 2);
    assert_eq!(report.hosts[1].cost, 10.0);
    assert_eq!(report.outages, vec!["site-1".to_string()]);

    world.deposit(10.0);
    world.deposit(-5.0);
    assert_eq!(world.account_balance(), 10.0);
    world.set_host_order(HostOrder::FarthestFirst);
    assert_eq!(world.host_order(), HostOrder::FarthestFirst);

    let report = engine.tick(&mut world, minutes_after_start(120)).unwrap();
    assert!(report.outages.is_empty());
    assert_eq!(report.account_balance, 0.0);
    assert!(report.active_customers > 0);
    assert!(report
        .records
        .iter()
        .filter(|r| r.is_served())
        .all(|r| r.host == Some(1)));
    assert_eq!(report.served, report.active_customers);
}
