/*!
 * Tests for the script walker marker protocol and context handling
 */

use std::sync::atomic::{AtomicUsize, Ordering};

use lune_translator::app_config::Config;
use lune_translator::errors::TranslationError;
use lune_translator::providers::mock::MockProvider;
use lune_translator::translation::context::{SpeakerTable, CONTEXT_LABEL};
use lune_translator::translation::formatting::REFUSAL_PHRASE;
use lune_translator::translation::prompts::SPEAKER_NAME_HINT;
use lune_translator::translation::{PromptTemplate, ScriptWalker, TranslationMode, WalkerOptions};
use lune_translator::ScriptBuffer;

use crate::common::{dictionary_reply, mock_service};

fn known_speakers() -> SpeakerTable {
    SpeakerTable::new(Config::default().script.known_speakers)
}

#[tokio::test]
async fn test_walk_withResetMarkerAndEnglishLine_shouldRecordLineWithoutCall() {
    let provider = MockProvider::working();
    let service = mock_service(&provider);
    let mut walker = ScriptWalker::new(&service, known_speakers(), WalkerOptions::default());

    let walked = walker.walk(ScriptBuffer::from_lines(["00000000", "Hello"])).await.unwrap();

    assert_eq!(walked.buffer.text(0), Some("00000000"));
    assert_eq!(walked.buffer.text(1), Some("Hello"));
    assert_eq!(walked.tokens, 0);
    assert_eq!(walked.dialogue_lines, 1);
    assert_eq!(provider.request_count(), 0);
    assert_eq!(walker.history().entries().collect::<Vec<_>>(), vec!["\"Hello\""]);
}

#[tokio::test]
async fn test_walk_withEnglishAndJapaneseDialogue_shouldWrapAndRememberEnglishLines() {
    let english = "Good morning, class. Today we will be reviewing the chapter on old castles.";
    let provider = MockProvider::working().with_custom_response(dictionary_reply);
    let service = mock_service(&provider);
    let mut walker = ScriptWalker::new(&service, known_speakers(), WalkerOptions::default());

    let walked = walker
        .walk(ScriptBuffer::from_lines(["00003000", "John", english, "こんにちは"]))
        .await
        .unwrap();

    assert_eq!(
        walked.buffer.text(2),
        Some("Good morning, class. Today we will be\\nreviewing the chapter on old castles.")
    );
    assert_eq!(walked.buffer.text(3), Some("Hello"));
    assert_eq!(walked.tokens, MockProvider::TOKENS_PER_CALL);

    // Only the Japanese line reached the model, with the English one as context
    assert_eq!(provider.request_count(), 1);
    let requests = provider.recorded_requests();
    assert!(requests[0].messages[0].content.contains(&format!("John: {}", english)));
    assert_eq!(
        walker.history().entries().collect::<Vec<_>>(),
        vec![format!("John: {}", english), "John: Hello".to_string()]
    );
}

#[tokio::test]
async fn test_walk_withReusedWalker_shouldStartFromCleanContext() {
    let provider = MockProvider::working().with_custom_response(dictionary_reply);
    let service = mock_service(&provider);
    let mut walker = ScriptWalker::new(&service, known_speakers(), WalkerOptions::default());

    walker
        .walk(ScriptBuffer::from_lines(["00003000", "John", "こんにちは"]))
        .await
        .unwrap();
    assert_eq!(walker.current_speaker(), Some("John"));

    let walked = walker.walk(ScriptBuffer::from_lines(["さようなら"])).await.unwrap();

    assert_eq!(walked.buffer.text(0), Some("Goodbye"));
    let requests = provider.recorded_requests();
    assert_eq!(requests[1].last_user_message(), Some("Line to Translate = さようなら"));
    assert_eq!(requests[1].messages[0].content, CONTEXT_LABEL);
    assert_eq!(walker.current_speaker(), None);
    assert_eq!(walker.history().entries().collect::<Vec<_>>(), vec!["\"Goodbye\""]);
}

#[tokio::test]
async fn test_walk_withKnownSpeaker_shouldAttributeDialogueWithoutNameCall() {
    let provider = MockProvider::working().with_custom_response(dictionary_reply);
    let service = mock_service(&provider);
    let mut walker = ScriptWalker::new(&service, known_speakers(), WalkerOptions::default());

    let walked = walker
        .walk(ScriptBuffer::from_lines(["00003000", "John", "こんにちは"]))
        .await
        .unwrap();

    assert_eq!(provider.translated_lines(), vec!["John: こんにちは".to_string()]);
    assert_eq!(walked.buffer.text(1), Some("John"));
    assert_eq!(walked.buffer.text(2), Some("Hello"));
    assert_eq!(walked.tokens, MockProvider::TOKENS_PER_CALL);
    assert_eq!(walker.current_speaker(), Some("John"));
    assert_eq!(walker.history().entries().collect::<Vec<_>>(), vec!["John: Hello"]);
}

#[tokio::test]
async fn test_walk_withJapaneseKnownSpeaker_shouldSubstituteEnglishName() {
    let provider = MockProvider::working().with_custom_response(dictionary_reply);
    let service = mock_service(&provider);
    let mut walker = ScriptWalker::new(&service, known_speakers(), WalkerOptions::default());

    let walked = walker
        .walk(ScriptBuffer::from_lines(["00002000", "女教師", "ありがとう"]))
        .await
        .unwrap();

    assert_eq!(walked.buffer.text(1), Some("Female Teacher"));
    assert_eq!(walked.buffer.text(2), Some("Thank you"));
    assert_eq!(provider.translated_lines(), vec!["Female Teacher: ありがとう".to_string()]);
}

#[tokio::test]
async fn test_walk_withUnknownSpeaker_shouldTranslateNameWithTersePrompt() {
    let provider = MockProvider::working().with_custom_response(dictionary_reply);
    let service = mock_service(&provider);
    let mut walker = ScriptWalker::new(&service, known_speakers(), WalkerOptions::default());

    let walked = walker
        .walk(ScriptBuffer::from_lines(["00003000", "アリア", "こんにちは"]))
        .await
        .unwrap();

    let requests = provider.recorded_requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].system, PromptTemplate::TERSE);
    assert!(requests[0].messages.iter().any(|m| m.content == SPEAKER_NAME_HINT));
    assert_eq!(requests[1].last_user_message(), Some("Line to Translate = Aria: こんにちは"));

    // Trailing period of the model's answer is dropped
    assert_eq!(walked.buffer.text(1), Some("Aria"));
    assert_eq!(walked.buffer.text(2), Some("Hello"));
    assert_eq!(walked.tokens, 2 * MockProvider::TOKENS_PER_CALL);
}

#[tokio::test]
async fn test_walk_withResetMarker_shouldClearSpeaker() {
    let provider = MockProvider::working().with_custom_response(dictionary_reply);
    let service = mock_service(&provider);
    let mut walker = ScriptWalker::new(&service, known_speakers(), WalkerOptions::default());

    walker
        .walk(ScriptBuffer::from_lines(["00003000", "Bob", "こんにちは", "00000000", "さようなら"]))
        .await
        .unwrap();

    assert_eq!(
        provider.translated_lines(),
        vec!["Bob: こんにちは".to_string(), "さようなら".to_string()]
    );
    assert_eq!(walker.current_speaker(), None);
    assert_eq!(
        walker.history().entries().collect::<Vec<_>>(),
        vec!["Bob: Hello", "\"Goodbye\""]
    );
}

#[tokio::test]
async fn test_walk_shouldPreserveLengthAndLineEndings() {
    let provider = MockProvider::working().with_custom_response(dictionary_reply);
    let service = mock_service(&provider);
    let mut walker = ScriptWalker::new(&service, known_speakers(), WalkerOptions::default());

    let input = ScriptBuffer::from_text("00003000\r\nJohn\r\nこんにちは\r\n00000000\r\nさようなら\r\n");
    let walked = walker.walk(input.clone()).await.unwrap();

    assert_eq!(walked.buffer.len(), input.len());
    assert_eq!(walked.buffer.to_text(), "00003000\r\nJohn\r\nHello\r\n00000000\r\nGoodbye\r\n");
}

#[tokio::test]
async fn test_walk_withManyLines_shouldKeepTenMostRecentInHistory() {
    let provider = MockProvider::working().with_custom_response(dictionary_reply);
    let service = mock_service(&provider);
    let mut walker = ScriptWalker::new(&service, known_speakers(), WalkerOptions::default());

    let lines: Vec<String> = (0..25).map(|i| format!("こんにちは{}", i)).collect();
    walker.walk(ScriptBuffer::from_lines(lines)).await.unwrap();

    let expected: Vec<String> = (15..25).map(|i| format!("\"Hello{}\"", i)).collect();
    assert_eq!(walker.history().len(), 10);
    assert_eq!(walker.history().entries().collect::<Vec<_>>(), expected);

    // The last request saw the ten lines before it as context
    let requests = provider.recorded_requests();
    let context = &requests[24].messages[0].content;
    assert!(context.starts_with(CONTEXT_LABEL));
    assert!(context.contains("\"Hello23\""));
    assert!(context.contains("\"Hello14\""));
    assert!(!context.contains("\"Hello13\""));
}

#[tokio::test]
async fn test_walk_withMarkerOnLastLine_shouldStopCleanly() {
    let provider = MockProvider::working();
    let service = mock_service(&provider);
    let mut walker = ScriptWalker::new(&service, known_speakers(), WalkerOptions::default());

    let walked = walker.walk(ScriptBuffer::from_lines(["00003000"])).await.unwrap();
    assert_eq!(walked.buffer, ScriptBuffer::from_lines(["00003000"]));

    let walked = walker.walk(ScriptBuffer::from_lines(["00003000", "Tom"])).await.unwrap();
    assert_eq!(walked.buffer.text(1), Some("Tom"));
    assert_eq!(walked.dialogue_lines, 0);
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test]
async fn test_walk_withExhaustedRetries_shouldReturnOriginalAndPartialTokens() {
    fn refuse_goodbye(line: &str) -> String {
        if line.contains("さようなら") {
            format!("{}.", REFUSAL_PHRASE)
        } else {
            dictionary_reply(line)
        }
    }

    let provider = MockProvider::working().with_custom_response(refuse_goodbye);
    let service = mock_service(&provider);
    let mut walker = ScriptWalker::new(&service, known_speakers(), WalkerOptions::default());

    let input = ScriptBuffer::from_lines(["こんにちは", "さようなら", "ありがとう"]);
    let failure = walker.walk(input.clone()).await.unwrap_err();

    assert_eq!(failure.original, input);
    assert_eq!(failure.tokens, MockProvider::TOKENS_PER_CALL);
    assert!(matches!(failure.source, TranslationError::RetriesExhausted { attempts: 5, .. }));
    // One success, five refused attempts, nothing after the failure
    assert_eq!(provider.request_count(), 6);
}

#[tokio::test]
async fn test_walk_withFailingProvider_shouldFail() {
    let provider = MockProvider::failing();
    let service = mock_service(&provider);
    let mut walker = ScriptWalker::new(&service, known_speakers(), WalkerOptions::default());

    let result = walker.walk(ScriptBuffer::from_lines(["00000000", "こんにちは"])).await;

    let failure = result.unwrap_err();
    assert_eq!(failure.tokens, 0);
    assert_eq!(provider.request_count(), 5);
}

#[tokio::test]
async fn test_walk_withEstimateMode_shouldNotCallProvider() {
    let provider = MockProvider::working();
    let service = mock_service(&provider).with_mode(TranslationMode::Estimate);
    let mut walker = ScriptWalker::new(&service, known_speakers(), WalkerOptions::default());

    let input = ScriptBuffer::from_lines(["00003000", "アリア", "こんにちは"]);
    let walked = walker.walk(input.clone()).await.unwrap();

    assert_eq!(provider.request_count(), 0);
    assert!(walked.tokens > 0);
    assert_eq!(walked.buffer, input);
}

#[tokio::test]
async fn test_walk_withLongReply_shouldWrapWithLiteralBreaks() {
    let provider = MockProvider::working().with_custom_response(|_| {
        "Translation: The quick brown fox jumps over the lazy dog and keeps running far away".to_string()
    });
    let service = mock_service(&provider);
    let mut walker = ScriptWalker::new(&service, known_speakers(), WalkerOptions::default());

    let walked = walker.walk(ScriptBuffer::from_lines(["こんにちは"])).await.unwrap();

    let text = walked.buffer.text(0).unwrap();
    assert_eq!(text, "The quick brown fox jumps over the lazy\\ndog and keeps running far away");
    assert!(!text.contains('\n'));
}

#[tokio::test]
async fn test_walk_withUnmarkedLinesDisabled_shouldOnlyTranslateMarkedDialogue() {
    let provider = MockProvider::working().with_custom_response(dictionary_reply);
    let service = mock_service(&provider);
    let options = WalkerOptions {
        translate_unmarked_lines: false,
        ..WalkerOptions::default()
    };
    let mut walker = ScriptWalker::new(&service, known_speakers(), options);

    let walked = walker
        .walk(ScriptBuffer::from_lines(["こんにちは", "00000000", "さようなら"]))
        .await
        .unwrap();

    assert_eq!(walked.buffer.text(0), Some("こんにちは"));
    assert_eq!(walked.buffer.text(2), Some("Goodbye"));
    assert_eq!(provider.request_count(), 1);
}

#[tokio::test]
async fn test_walk_withProgressCallback_shouldTickPerDialogueLine() {
    let provider = MockProvider::working().with_custom_response(dictionary_reply);
    let service = mock_service(&provider);
    let ticks = AtomicUsize::new(0);
    let mut walker = ScriptWalker::new(&service, known_speakers(), WalkerOptions::default()).with_progress(|| {
        ticks.fetch_add(1, Ordering::SeqCst);
    });

    let walked = walker
        .walk(ScriptBuffer::from_lines(["00003000", "John", "こんにちは", "ありがとう"]))
        .await
        .unwrap();

    assert_eq!(walked.dialogue_lines, 2);
    assert_eq!(ticks.load(Ordering::SeqCst), 2);
}
