/*!
 * Integration tests for application lifecycle
 */

use anyhow::Result;
use std::sync::Arc;

use redub::app_config::Config;
use redub::app_controller::{Controller, ISSUES_LOG_FILE};
use redub::media_tools::MediaTool;
use redub::pipeline::RunMode;
use redub::providers::mock::MockSynthesizer;

use crate::common::{
    self,
    fake_media::{FakeMediaTool, MediaOp},
    DUB_CUES, REFERENCE_CUES,
};

fn controller(media: Arc<FakeMediaTool>, mock: MockSynthesizer) -> (Controller, Arc<MockSynthesizer>) {
    let (registry, mock) = common::registry_with(mock);
    let media: Arc<dyn MediaTool> = media;
    (Controller::with_components(Config::default(), registry, media), mock)
}

/// Test the controller initialization with default config
#[test]
fn test_controller_withDefaultConfig_shouldInitialize() -> Result<()> {
    let controller = Controller::with_config(Config::default())?;

    assert_eq!(controller.config().target_language, "est");
    Ok(())
}

/// Test the controller rejects a target language without voice
#[test]
fn test_controller_withoutVoiceForTarget_shouldFailOnRun() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let mut config = Config::default();
    config.target_language = "fin".to_string();
    let controller = Controller::with_config(config)?;

    let result = tokio_test::block_on(controller.run_folder(dir.path(), &dir.path().join("out"), RunMode::Full));

    assert!(result.is_err());
    Ok(())
}

#[tokio::test]
async fn test_runFolder_withMissingInput_shouldFail() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let (controller, _) = controller(Arc::new(FakeMediaTool::new(None)), MockSynthesizer::working());

    let result = controller
        .run_folder(&dir.path().join("nope"), &dir.path().join("out"), RunMode::Full)
        .await;

    assert!(result.is_err());
    Ok(())
}

/// Good items are dubbed, broken ones are reported, orphans are skipped
#[tokio::test]
async fn test_runFolder_withMixedItems_shouldContinuePastFailures() -> Result<()> {
    common::init_logger();
    let dir = common::create_temp_dir()?;
    let input = dir.path().join("input");
    let output = dir.path().join("output");
    common::create_media_item(&input, "a", "good", &common::srt_content(&DUB_CUES))?;
    common::create_media_item(&input, "b", "broken", "not subtitles at all")?;
    common::create_test_file(&input, "c/orphan.srt", &common::srt_content(&DUB_CUES))?;

    let media = Arc::new(FakeMediaTool::new(Some(common::srt_content(&REFERENCE_CUES))));
    let (controller, mock) = controller(media.clone(), MockSynthesizer::working());

    let summary = controller.run_folder(&input, &output, RunMode::Full).await?;

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.missing_pairings, 1);
    assert_eq!(summary.pairing_issues.len(), 1);
    assert!(summary.pairing_issues[0].starts_with("No video file found for subtitles"));
    assert!(summary.pairing_issues[0].ends_with("orphan.srt"));
    assert_eq!(summary.failures.len(), 1);
    assert!(summary.failures[0].0.ends_with("broken.mkv"));
    assert!(output.join("a").join("good.mkv").is_file());
    assert_eq!(mock.request_count(), 2);

    let log = std::fs::read_to_string(output.join(ISSUES_LOG_FILE))?;
    assert!(log.contains("1 processed, 0 skipped, 1 errors, 1 missing pairings"));
    assert!(log.contains("FAILED"));
    assert!(log.contains("SKIPPED No video file found for subtitles"));

    Ok(())
}

/// A second folder run skips finished items without external calls
#[tokio::test]
async fn test_runFolder_runTwice_shouldSkipFinishedItems() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let input = dir.path().join("input");
    let output = dir.path().join("output");
    common::create_media_item(&input, "", "movie", &common::srt_content(&DUB_CUES))?;

    let media = Arc::new(FakeMediaTool::new(Some(common::srt_content(&REFERENCE_CUES))));
    let (controller, mock) = controller(media.clone(), MockSynthesizer::working());

    controller.run_folder(&input, &output, RunMode::Full).await?;
    let calls = media.calls().len();

    let summary = controller.run_folder(&input, &output, RunMode::Full).await?;

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.processed, 0);
    assert_eq!(media.calls().len(), calls);
    assert_eq!(mock.request_count(), 2);
    Ok(())
}

/// Output nested inside the input is not rediscovered
#[tokio::test]
async fn test_runFolder_withOutputInsideInput_shouldIgnoreGeneratedFiles() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let input = dir.path().to_path_buf();
    let output = input.join("dubbed");
    common::create_media_item(&input, "", "movie", &common::srt_content(&DUB_CUES))?;

    let media = Arc::new(FakeMediaTool::new(Some(common::srt_content(&REFERENCE_CUES))));
    let (controller, _) = controller(media.clone(), MockSynthesizer::working());

    controller.run_folder(&input, &output, RunMode::Full).await?;
    let summary = controller.run_folder(&input, &output, RunMode::Full).await?;

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.missing_pairings, 0);
    Ok(())
}

/// A media tool failure fails its item only
#[tokio::test]
async fn test_runFolder_withFailingMix_shouldContinueWithNextItem() -> Result<()> {
    common::init_logger();
    let dir = common::create_temp_dir()?;
    let input = dir.path().join("input");
    let output = dir.path().join("output");
    common::create_media_item(&input, "a", "first", &common::srt_content(&DUB_CUES))?;
    common::create_media_item(&input, "b", "second", &common::srt_content(&DUB_CUES))?;

    let media = Arc::new(
        FakeMediaTool::new(Some(common::srt_content(&REFERENCE_CUES))).with_failing_for(MediaOp::Mix, "first"),
    );
    let (controller, _mock) = controller(media.clone(), MockSynthesizer::working());

    let summary = controller.run_folder(&input, &output, RunMode::Full).await?;

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.processed, 1);
    assert!(summary.failures[0].0.ends_with("first.mkv"));
    assert!(summary.failures[0].1.contains("Media tool error"));
    assert_eq!(media.mix_count(), 2);
    assert_eq!(media.mux_count(), 1);
    assert!(output.join("b").join("second.mkv").is_file());
    assert!(!output.join("a").join("first.mkv").exists());
    Ok(())
}
