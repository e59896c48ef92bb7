mod common;

use std::rc::Rc;

use anyhow::{Result, anyhow};
use common::{
    Recorder, THREE_SECTIONS, bootstrap, bootstrap_with, environment, init_logging, memory_store,
    section_statuses, shared_page,
};
use html::parse_document;
use page_loader::bootstrap::APPEAR_CLASS;
use page_loader::fonts::{FONTS_LOADED_KEY, origin_of};
use page_loader::status::{BLOCK_STATUS_ATTR, read_status};
use page_loader::{
    LoadStatus, LoaderConfig, Phase, SessionStore as _, SharedDocument, UnavailableSessionStore,
};
use tokio::task::LocalSet;
use tokio::time::{Duration, Instant, sleep};

#[tokio::test(start_paused = true)]
async fn full_bootstrap_loads_every_section_then_chrome() -> Result<()> {
    init_logging();
    LocalSet::new()
        .run_until(async {
            let recorder = Recorder::new();
            let doc = shared_page(THREE_SECTIONS)?;
            let page = bootstrap(&recorder, environment("https://example.com/", 1200)?, memory_store());

            let (report, summary) = page.run(&doc).await;

            assert!(report.appeared);
            assert_eq!(report.first_section, Some(LoadStatus::Loaded));
            assert_eq!((report.sections.loaded, report.sections.failed), (2, 0));
            assert_eq!(report.timings.sections_loaded, 3);
            assert_eq!(doc.read(section_statuses), vec![Some(LoadStatus::Loaded); 3]);

            assert_eq!(recorder.count("header"), 1);
            assert_eq!(recorder.count("footer"), 1);
            assert_eq!(recorder.count("first_image"), 1);
            let last_block = recorder
                .position("block:quote")
                .ok_or_else(|| anyhow!("quote block never loaded"))?;
            for chrome in ["header", "footer"] {
                let at = recorder
                    .position(chrome)
                    .ok_or_else(|| anyhow!("{chrome} never loaded"))?;
                assert!(at > last_block, "{chrome} loaded before the last section");
            }

            assert!(summary.failed.is_empty(), "{:?}", summary.failed);
            assert_eq!(recorder.count("delayed"), 1);
            assert_eq!(page.completed_phase(), Some(Phase::Delayed));

            doc.read(|dom| -> Result<()> {
                let root = dom.root();
                let body = dom.first_by_tag(root, "body").ok_or_else(|| anyhow!("no body"))?;
                assert!(dom.has_class(body, APPEAR_CLASS));
                let html = dom.first_by_tag(root, "html").ok_or_else(|| anyhow!("no html"))?;
                assert_eq!(dom.attr(html, "lang"), Some("en"));
                let links = dom.all_by_tag(root, "link");
                for href in ["/styles/fonts.css", "/styles/lazy-styles.css", "/blocks/cards/cards.css"] {
                    let count = links
                        .iter()
                        .filter(|link| dom.attr(**link, "href") == Some(href))
                        .count();
                    assert_eq!(count, 1, "{href}");
                }
                assert!(dom.first_with_attr(root, "script", "src", "/scripts/delayed.js").is_some());
                let header = dom.first_by_class(root, "header").ok_or_else(|| anyhow!("no header block"))?;
                assert_eq!(read_status(dom, header, BLOCK_STATUS_ATTR), Some(LoadStatus::Loaded));
                Ok(())
            })
        })
        .await
}

#[tokio::test(start_paused = true)]
async fn lazy_work_waits_for_the_first_image() -> Result<()> {
    LocalSet::new()
        .run_until(async {
            let recorder = Recorder::new();
            let doc = shared_page(THREE_SECTIONS)?;
            let page = bootstrap(&recorder, environment("https://example.com/", 400)?, memory_store());

            let eager = page.load_eager(&doc).await;
            assert_eq!(eager.first_section, Some(LoadStatus::Loaded));
            assert_eq!(page.completed_phase(), Some(Phase::Eager));
            assert_eq!(recorder.events(), ["block:cards", "first_image"]);
            assert_eq!(
                doc.read(section_statuses),
                [
                    Some(LoadStatus::Loaded),
                    Some(LoadStatus::Unloaded),
                    Some(LoadStatus::Unloaded)
                ]
            );

            page.load_lazy(&doc).await;
            let first_image = recorder.position("first_image");
            assert!(recorder.position("header") > first_image);
            assert!(recorder.position("footer") > first_image);
            assert!(recorder.position("block:columns") > first_image);
            anyhow::Ok(())
        })
        .await
}

#[tokio::test(start_paused = true)]
async fn delayed_phase_waits_three_seconds() -> Result<()> {
    LocalSet::new()
        .run_until(async {
            let recorder = Recorder::new();
            let doc = shared_page(THREE_SECTIONS)?;
            let page = bootstrap(&recorder, environment("https://example.com/", 400)?, memory_store());

            let started = Instant::now();
            page.load_page(&doc).await;
            assert_eq!(recorder.count("delayed"), 0, "delayed ran inside the phase chain");

            sleep(Duration::from_millis(2900)).await;
            assert_eq!(recorder.count("delayed"), 0);
            sleep(Duration::from_millis(200)).await;
            assert_eq!(recorder.count("delayed"), 1);

            let summary = page.tasks().drain().await;
            assert!(summary.failed.is_empty());
            assert!(started.elapsed() >= Duration::from_secs(3));
            anyhow::Ok(())
        })
        .await
}

#[tokio::test(start_paused = true)]
async fn fonts_flag_makes_later_loads_eager() -> Result<()> {
    init_logging();
    LocalSet::new()
        .run_until(async {
            let store = memory_store();
            let env = environment("https://example.com/page", 1200)?;
            let origin = origin_of(&env.url);

            let first = bootstrap(&Recorder::new(), env, store.clone());
            first.run(&shared_page(THREE_SECTIONS)?).await;
            assert_eq!(store.get_item(&origin, FONTS_LOADED_KEY)?.as_deref(), Some("true"));

            let narrow = environment("https://example.com/other", 400)?;
            let second = bootstrap(&Recorder::new(), narrow.clone(), store.clone());
            let eager = second.load_eager(&shared_page(THREE_SECTIONS)?).await;
            assert!(eager.fonts_eager);
            assert!(second.tasks().spawned().iter().any(|name| name == "fonts:eager"));

            let fresh = bootstrap(&Recorder::new(), narrow, memory_store());
            let eager = fresh.load_eager(&shared_page(THREE_SECTIONS)?).await;
            assert!(!eager.fonts_eager);
            assert!(fresh.tasks().spawned().is_empty());
            anyhow::Ok(())
        })
        .await
}

#[tokio::test(start_paused = true)]
async fn localhost_never_writes_the_fonts_flag() -> Result<()> {
    LocalSet::new()
        .run_until(async {
            let store = memory_store();
            let env = environment("http://localhost:3000/", 1200)?;
            let origin = origin_of(&env.url);
            let page = bootstrap(&Recorder::new(), env, store.clone());
            let doc = shared_page(THREE_SECTIONS)?;
            page.run(&doc).await;

            assert_eq!(store.len(&origin), 0);
            let fonts = doc.read(|dom| {
                dom.first_with_attr(dom.root(), "link", "href", "/styles/fonts.css")
                    .is_some()
            });
            assert!(fonts);
            anyhow::Ok(())
        })
        .await
}

#[tokio::test(start_paused = true)]
async fn unavailable_storage_is_skipped() -> Result<()> {
    init_logging();
    LocalSet::new()
        .run_until(async {
            let recorder = Recorder::new();
            let store = Rc::new(UnavailableSessionStore);
            let page = bootstrap(&recorder, environment("https://example.com/", 400)?, store);
            let doc = shared_page(THREE_SECTIONS)?;

            let eager = page.load_eager(&doc).await;
            assert!(!eager.fonts_eager);
            page.load_lazy(&doc).await;
            page.load_delayed(&doc);
            let summary = page.tasks().drain().await;

            assert!(summary.failed.is_empty(), "{:?}", summary.failed);
            assert_eq!(recorder.count("css:/styles/fonts.css"), 1);
            anyhow::Ok(())
        })
        .await
}

#[tokio::test(start_paused = true)]
async fn fragment_target_is_scrolled_into_view() -> Result<()> {
    LocalSet::new()
        .run_until(async {
            let recorder = Recorder::new();
            let doc = shared_page(
                r#"<div><p>One</p></div><div><h2 id="second">Two</h2></div><div><p>Three</p></div>"#,
            )?;
            let page = bootstrap(
                &recorder,
                environment("https://example.com/#second", 400)?,
                memory_store(),
            );

            page.load_eager(&doc).await;
            let lazy = page.load_lazy(&doc).await;

            assert_eq!(lazy.scrolled_to.as_deref(), Some("second"));
            assert_eq!(recorder.count("scroll"), 1);
            let marked = doc.read(|dom| {
                dom.element_by_id("second")
                    .and_then(|target| dom.attr(target, "data-scrolled-into-view"))
                    .map(str::to_owned)
            });
            assert_eq!(marked.as_deref(), Some("true"));
            anyhow::Ok(())
        })
        .await
}

#[tokio::test(start_paused = true)]
async fn missing_fragment_target_is_ignored() -> Result<()> {
    LocalSet::new()
        .run_until(async {
            let recorder = Recorder::new();
            let doc = shared_page(THREE_SECTIONS)?;
            let page = bootstrap(
                &recorder,
                environment("https://example.com/#nowhere", 400)?,
                memory_store(),
            );
            page.load_eager(&doc).await;
            let lazy = page.load_lazy(&doc).await;
            assert_eq!(lazy.scrolled_to, None);
            assert_eq!(recorder.count("scroll"), 0);
            anyhow::Ok(())
        })
        .await
}

#[tokio::test(start_paused = true)]
async fn page_without_main_still_completes() -> Result<()> {
    LocalSet::new()
        .run_until(async {
            let recorder = Recorder::new();
            let doc = SharedDocument::new(parse_document(
                "<html><head></head><body><p>No main here</p></body></html>",
            )?);
            let page = bootstrap(&recorder, environment("https://example.com/", 1200)?, memory_store());

            let eager = page.load_eager(&doc).await;
            assert!(!eager.appeared);
            assert!(!page.has_appeared());
            assert_eq!(eager.first_section, None);
            assert!(eager.fonts_eager, "wide viewport loads fonts eagerly without main");
            assert!(!eager.widget_started);
            assert!(page.tasks().spawned().iter().any(|name| name == "fonts:eager"));

            let lazy = page.load_lazy(&doc).await;
            page.load_delayed(&doc);
            let summary = page.tasks().drain().await;

            assert_eq!(lazy.sections.loaded, 0);
            assert_eq!(recorder.count("header"), 0);
            assert!(summary.failed.is_empty());
            let head = doc.head().ok_or_else(|| anyhow!("no head"))?;
            let fonts = doc.read(|dom| {
                dom.first_with_attr(head, "link", "href", "/styles/fonts.css")
                    .is_some()
            });
            assert!(fonts);
            anyhow::Ok(())
        })
        .await
}

#[test]
fn block_on_page_runs_every_phase() -> Result<()> {
    init_logging();
    let recorder = Recorder::new();
    let config = LoaderConfig {
        delayed_ms: 0,
        telemetry_enabled: true,
        ..LoaderConfig::default()
    };
    let page = bootstrap_with(
        config,
        &recorder,
        environment("https://example.com/", 1200)?,
        memory_store(),
    );
    let doc = shared_page(THREE_SECTIONS)?;
    let (report, summary) = page.block_on_page(&doc)?;

    assert_eq!(report.timings.sections_loaded, 3);
    assert_eq!(summary.failed.len(), 0);
    assert_eq!(recorder.count("delayed"), 1);
    Ok(())
}
