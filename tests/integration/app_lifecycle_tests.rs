/*!
 * Integration tests for application lifecycle
 */

use anyhow::Result;
use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lune_translator::app_config::Config;
use lune_translator::providers::mock::MockProvider;
use lune_translator::Controller;

use crate::common;

/// Test the controller initialization with default config
#[test]
fn test_controller_initialization_withDefaultConfig_shouldSucceed() -> Result<()> {
    let controller = Controller::with_config(Config::default())?;
    assert_eq!(controller.config().script.workers, 20);
    Ok(())
}

/// An empty input directory is an error, not an empty run
#[test]
fn test_run_withEmptyInputDirectory_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::test_config(temp_dir.path());
    fs::create_dir_all(temp_dir.path().join("files"))?;

    let controller = Controller::with_config(config)?.with_provider(Arc::new(MockProvider::working()));
    let result = tokio_test::block_on(controller.run(Vec::new()));

    assert!(result.is_err());
    Ok(())
}

/// A missing input directory is reported before any work starts
#[test]
fn test_run_withMissingInputDirectory_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::test_config(temp_dir.path());

    let controller = Controller::with_config(config)?;
    let result = tokio_test::block_on(controller.run(Vec::new()));

    assert!(result.is_err());
    Ok(())
}

/// Files are processed concurrently up to the worker count
#[tokio::test]
async fn test_run_withSlowProvider_shouldOverlapFiles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut config = common::test_config(temp_dir.path());
    config.script.workers = 4;
    let files_dir = temp_dir.path().join("files");
    fs::create_dir_all(&files_dir)?;
    for i in 0..4 {
        common::create_sjis_script(&files_dir, &format!("f{}.txt", i), &["こんにちは"])?;
    }

    let provider = MockProvider::slow(300);
    let controller = Controller::with_config(config)?.with_provider(Arc::new(provider.clone()));

    let start = Instant::now();
    let summary = controller.run(Vec::new()).await?;
    let elapsed = start.elapsed();

    assert_eq!(summary.reports.len(), 4);
    assert_eq!(provider.request_count(), 4);
    assert_eq!(summary.totals.files, 4);
    assert!(elapsed < Duration::from_millis(1100), "files ran sequentially: {:?}", elapsed);
    Ok(())
}
