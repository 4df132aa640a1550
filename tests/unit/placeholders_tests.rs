/*!
 * Tests for control code masking as seen through the translation service
 */

use lune_translator::providers::mock::MockProvider;
use lune_translator::translation::{mask, unmask, PromptKind, TranslationKind};

use crate::common::mock_service;

#[test]
fn test_mask_shouldNumberCodesPerClassInFirstSeenOrder() {
    let (masked, table) = mask(r"\N[1]は\c[4]剣\c[0]と\c[4]盾\c[0]を手に入れた");
    assert_eq!(masked, "[N_0]は[Color_0]剣[Color_1]と[Color_0]盾[Color_1]を手に入れた");
    assert_eq!(table.len(), 3);
}

#[test]
fn test_unmask_withUnknownIndex_shouldLeaveTokenInPlace() {
    let (_, table) = mask(r"\c[1]赤");
    assert_eq!(unmask("[Color_0]red [Color_7]", &table), r"\c[1]red [Color_7]");
}

#[tokio::test]
async fn test_translate_withSpacedTokensInReply_shouldRestoreCodes() {
    fn spaced_reply(line: &str) -> String {
        format!(
            "Translation: {}",
            line.replace("[Color_0]", "[ Color_0 ]")
                .replace("[Color_1]", "[Color _1]")
                .replace("剣", "sword")
        )
    }

    let provider = MockProvider::working().with_custom_response(spaced_reply);
    let service = mock_service(&provider);

    let result = service
        .translate(r"\c[4]剣\c[0]", "", PromptKind::Full)
        .await
        .unwrap();

    assert_eq!(provider.translated_lines(), vec!["[Color_0]剣[Color_1]".to_string()]);
    assert_eq!(result.text, r"\c[4]sword\c[0]");
    assert_eq!(result.kind, TranslationKind::Translated);
}

#[tokio::test]
async fn test_translate_withOnlyCodesAndAscii_shouldShortCircuit() {
    let provider = MockProvider::working();
    let service = mock_service(&provider);

    let result = service
        .translate(r"\V[3] Gold \i[12]", "", PromptKind::Full)
        .await
        .unwrap();

    assert_eq!(result.text, r"\V[3] Gold \i[12]");
    assert_eq!(result.tokens, 0);
    assert_eq!(provider.request_count(), 0);
}
