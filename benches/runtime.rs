use std::io;
use std::time::Duration;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use eppa_venue::app::build_runtime;
use eppa_venue::chat::{ChatBackend, ChatError, ChatRelay, ChatSession, ChatWorker};
use eppa_venue::config::AppConfig;
use eppa_venue::logging::{LogEvent, LogSink};
use eppa_venue::{AreaCatalog, Floor, Logger, LoggingResult, PageRuntime, RuntimeEvent, Size, VenueMap};

#[derive(Clone, Default)]
struct NullSink;

impl LogSink for NullSink {
    fn log(&self, _event: &LogEvent) -> LoggingResult<()> {
        Ok(())
    }
}

struct EchoSession;

impl ChatSession for EchoSession {
    fn send(&mut self, message: &str) -> Result<String, ChatError> {
        Ok(format!("Respire. Você disse: {message}"))
    }
}

struct EchoBackend;

impl ChatBackend for EchoBackend {
    fn is_configured(&self) -> bool {
        true
    }

    fn start_session(&self, _system_instruction: &str) -> Result<Box<dyn ChatSession>, ChatError> {
        Ok(Box::new(EchoSession))
    }
}

fn key(code: KeyCode) -> RuntimeEvent {
    RuntimeEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn tick(ms: u64) -> RuntimeEvent {
    RuntimeEvent::Tick {
        elapsed: Duration::from_millis(ms),
    }
}

fn build_venue_runtime() -> eppa_venue::Result<PageRuntime> {
    let logger = Logger::new(NullSink);
    let worker = ChatWorker::spawn(ChatRelay::new(Box::new(EchoBackend), "zen", None))?;
    let config = AppConfig {
        submit_latency_ms: 500,
        ..AppConfig::default()
    };
    let mut runtime = build_runtime(&config, Some(logger), worker, Size::new(120, 36))?;
    runtime.config_mut().metrics_interval = Duration::from_millis(0);
    Ok(runtime)
}

fn venue_events() -> Vec<RuntimeEvent> {
    let mut events = vec![RuntimeEvent::Resize(Size::new(120, 36))];
    for _ in 0..10 {
        events.push(key(KeyCode::Right));
        events.push(key(KeyCode::Enter));
        events.push(key(KeyCode::Char('2')));
        events.push(key(KeyCode::Right));
        events.push(key(KeyCode::Enter));
        events.push(key(KeyCode::Char('1')));
        events.push(tick(250));
    }
    events.push(key(KeyCode::Tab));
    events.push(key(KeyCode::Down));
    events.push(key(KeyCode::Enter));
    events.push(key(KeyCode::Tab));
    events.push(key(KeyCode::Tab));
    events.extend("Ana".chars().map(|ch| key(KeyCode::Char(ch))));
    events.push(key(KeyCode::Down));
    events.extend("ana@eppa.com".chars().map(|ch| key(KeyCode::Char(ch))));
    events.push(key(KeyCode::Enter));
    events.push(tick(250));
    events.push(tick(250));
    events.push(key(KeyCode::Tab));
    events.extend("Onde fica a Sala Zen?".chars().map(|ch| key(KeyCode::Char(ch))));
    events.push(key(KeyCode::Enter));
    events.push(tick(250));
    events
}

fn runtime_venue_script(c: &mut Criterion) {
    let script = venue_events();
    c.bench_function("runtime_venue_script", |b| {
        b.iter(|| {
            let mut runtime = build_venue_runtime().expect("runtime");
            let mut sink = io::sink();
            runtime
                .run_scripted(&mut sink, black_box(script.clone()))
                .expect("scripted run");
        });
    });
}

fn venue_map_transitions(c: &mut Criterion) {
    let ids: Vec<String> = AreaCatalog::eppa_default()
        .iter()
        .map(|area| area.id.clone())
        .collect();
    c.bench_function("venue_map_transitions", |b| {
        b.iter(|| {
            let mut map = VenueMap::new(AreaCatalog::eppa_default());
            let changes = map.subscribe();
            for floor in Floor::ALL {
                map.select_floor(floor);
                for id in &ids {
                    map.select_area(black_box(id));
                    map.select_area(black_box(id));
                }
            }
            black_box(changes.try_iter().count())
        });
    });
}

criterion_group!(benches, runtime_venue_script, venue_map_transitions);
criterion_main!(benches);
