use viva::speaking::feedback::{self, FeedbackField};

fn well_formed(language_use: &str, topic_development: &str, revised: &str) -> String {
    format!(
        "**Score for Language Use:** {language_use}\n\
         **Score for Topic Development:** {topic_development}\n\
         **Feedback:** The response is mostly coherent but uses simple structures.\n\
         **Revised Version:** {revised}",
    )
}

#[test]
fn parses_well_formed_feedback() {
    let raw = well_formed("3.0", "2.5", "I think the new policy is a good idea.");
    let parsed = feedback::parse(&raw, "I think new policy is good idea.", true).expect("parse");

    assert_eq!(parsed.language_use_score, 3.0);
    assert_eq!(parsed.topic_development_score, Some(2.5));
    assert_eq!(parsed.revised_text, "I think the new policy is a good idea.");
    assert_eq!(parsed.original_text, "I think new policy is good idea.");
    assert_eq!(parsed.overall_score(), 2.75);
}

#[test]
fn score_round_trip_on_whole_levels() {
    for lu in 0..=4 {
        for td in 0..=4 {
            let raw = well_formed(&format!("{lu}.0"), &format!("{td}.0"), "revised text");
            let parsed = feedback::parse(&raw, "original", true).expect("parse");
            assert_eq!(parsed.language_use_score, f64::from(lu));
            assert_eq!(parsed.topic_development_score, Some(f64::from(td)));
            assert_eq!(parsed.overall_score(), f64::from(lu + td) / 2.0);
        }
    }
}

#[test]
fn does_not_assume_integer_scores() {
    let raw = well_formed("2.7", "3.1", "revised");
    let parsed = feedback::parse(&raw, "original", true).expect("parse");
    assert_eq!(parsed.language_use_score, 2.7);
    assert_eq!(parsed.topic_development_score, Some(3.1));
}

#[test]
fn parsing_is_idempotent() {
    let raw = well_formed("3.5", "4.0", "the same revised text\nacross two lines");
    let first = feedback::parse(&raw, "original", true).expect("first parse");
    let second = feedback::parse(&raw, "original", true).expect("second parse");
    assert_eq!(first, second);
}

#[test]
fn revised_text_captures_multiline_tail() {
    let raw = well_formed("3.0", "3.0", "First sentence.\nSecond sentence.\n\nThird.");
    let parsed = feedback::parse(&raw, "original", true).expect("parse");
    assert_eq!(parsed.revised_text, "First sentence.\nSecond sentence.\n\nThird.");
}

#[test]
fn missing_revision_is_detected() {
    let raw = "**Score for Language Use:** 3.0\n\
               **Score for Topic Development:** 2.0\n\
               **Feedback:** fine";
    let err = feedback::parse(raw, "original", true).expect_err("should fail");
    assert_eq!(err.missing, vec![FeedbackField::Revision]);
}

#[test]
fn missing_language_use_is_detected() {
    let raw = "**Score for Topic Development:** 2.0\n\
               **Revised Version:** better text";
    let err = feedback::parse(raw, "original", true).expect_err("should fail");
    assert_eq!(err.missing, vec![FeedbackField::LanguageUse]);
    assert!(err.is_missing(FeedbackField::LanguageUse));
}

#[test]
fn all_missing_fields_are_reported_together() {
    let raw = "No response provided. Unable to evaluate language use or topic development.";
    let err = feedback::parse(raw, "", true).expect_err("should fail");
    assert_eq!(
        err.missing,
        vec![
            FeedbackField::LanguageUse,
            FeedbackField::TopicDevelopment,
            FeedbackField::Revision,
        ]
    );
}

#[test]
fn topic_development_optional_when_not_expected() {
    let raw = "**Score for Language Use:** 3.0\n\
               **Feedback:** fine\n\
               **Revised Version:** better text";
    let parsed = feedback::parse(raw, "original", false).expect("parse");
    assert_eq!(parsed.topic_development_score, None);
    assert_eq!(parsed.overall_score(), 3.0);
}

#[test]
fn topic_development_kept_when_present_but_not_expected() {
    let raw = well_formed("3.0", "2.0", "revised");
    let parsed = feedback::parse(&raw, "original", false).expect("parse");
    assert_eq!(parsed.topic_development_score, Some(2.0));
}

#[test]
fn malformed_score_token_counts_as_missing() {
    let raw = "**Score for Language Use:** excellent\n\
               **Score for Topic Development:** 2.0\n\
               **Revised Version:** better text";
    let err = feedback::parse(raw, "original", true).expect_err("should fail");
    assert_eq!(err.missing, vec![FeedbackField::LanguageUse]);
}
