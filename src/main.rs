//! Score Guard entry point
//!
//! The web build is the library (`ScoreGuard` and its start function live in
//! `web.rs`). Natively this replays the common tampering cases against
//! in-memory fakes.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    score_guard::logging::init();
    log::info!("Score guard (native) starting...");
    log::info!("Native mode uses in-memory storage - build for wasm32 to guard a real page");

    println!("\nReplaying tamper scenarios...");
    demo::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is score_guard::web::start, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use score_guard::platform::{Clock, KeyValueStore, ManualClock, MemoryStorage};
    use score_guard::{
        GuardConfig, IntegrityWatchdog, MemoryDisplay, ProtectedScore, ScoreDisplay, ScoreStore,
    };

    type Watchdog = IntegrityWatchdog<MemoryDisplay, MemoryStorage, ManualClock>;

    struct Page {
        score: ProtectedScore,
        display: MemoryDisplay,
        store: ScoreStore<MemoryStorage>,
        clock: ManualClock,
        watchdog: Watchdog,
    }

    impl Page {
        fn new(config: &GuardConfig, score: u64) -> Self {
            let score = ProtectedScore::new(score);
            let display = MemoryDisplay::new();
            display.render(&score.rendered());
            let store = ScoreStore::with_key(
                MemoryStorage::new(),
                config.codec(),
                config.storage_key.as_str(),
            );
            store.save(score.get());
            let clock = ManualClock::new(0.0);
            let mut watchdog = IntegrityWatchdog::new(
                score.clone(),
                display.clone(),
                store.clone(),
                clock.clone(),
                config.watchdog,
            );
            watchdog.arm();
            Self {
                score,
                display,
                store,
                clock,
                watchdog,
            }
        }

        fn tick_after(&mut self, ms: f64) {
            self.clock.advance(ms);
            let report = self.watchdog.tick();
            println!(
                "  t={:>6} ms  score={:<4} text={:<6} data-v={:<6} {:?}",
                self.clock_ms(),
                self.score.get(),
                self.display.text().unwrap_or_default(),
                self.display.value_attribute().unwrap_or_default(),
                report
            );
        }

        fn clock_ms(&self) -> f64 {
            self.clock.now_ms()
        }
    }

    pub fn run() {
        let config = GuardConfig::load();
        let interval = f64::from(config.watchdog.interval_ms);

        println!("DOM edit:");
        let mut page = Page::new(&config, 40);
        page.display.set_text("9999");
        page.tick_after(interval);
        assert!(page.display.shows("40"));

        println!("Storage edit:");
        let mut page = Page::new(&config, 40);
        let key = page.store.key().to_string();
        if let Err(e) = page.store.storage().set_item(&key, "eyJzY29yZSI6OTk5OX0.1") {
            log::warn!("Could not plant forged token: {}", e);
        }
        page.tick_after(interval * 10.0);
        assert_eq!(page.score.get(), 40);

        println!("Console edit, never saved, tab asleep past the grace window:");
        let mut page = Page::new(&config, 40);
        page.score.set(9999);
        page.tick_after(interval);
        page.tick_after(config.watchdog.grace_window_ms);
        assert_eq!(page.score.get(), 40);

        println!("Legitimate update, saved before the grace window ends:");
        let mut page = Page::new(&config, 40);
        page.score.add(10);
        page.display.render(&page.score.rendered());
        page.tick_after(interval);
        page.store.save(page.score.get());
        page.tick_after(config.watchdog.grace_window_ms);
        assert_eq!(page.score.get(), 50);

        println!("✓ All scenarios behaved as expected");
    }
}
