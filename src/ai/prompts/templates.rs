/// Placeholder replaced with the generated transcript.
pub const TRANSCRIPT_PLACEHOLDER: &str = "{transcript}";

/// Prompt for generating the MDT meeting transcript from the attached case study.
pub const GENERATE_TRANSCRIPT: &str = r#"You are given a clinical case study as an attached PDF.

Write a realistic transcript of a multidisciplinary team (MDT) meeting that discusses this case.

Requirements:
- Include the roles typically present for this kind of case (for example: chair, treating consultant, radiologist, pathologist, specialist nurse, and any other relevant specialties).
- Prefix every line with the speaker's role, e.g. "Radiologist: ...".
- Cover the case presentation, review of investigations, differential diagnosis, treatment options, and the agreed plan with named owners for each action.
- Use only facts stated in the case study. Where the case is silent, have participants say so rather than inventing findings.
- End with a short summary of the MDT outcome."#;

/// Prompt for checking the transcript against the case study.
pub const FACTUAL_CORRECTNESS: &str = r#"Below is a transcript of an MDT meeting generated from the attached case study.

Evaluate the transcript for FACTUAL CORRECTNESS against the case study:
- List every statement in the transcript that contradicts the case study, quoting the transcript line and the relevant case detail.
- List every clinical fact in the transcript that is not supported by the case study (hallucinated findings, results, dates, doses).
- List important facts from the case study that the transcript omits.
- Give an overall factual correctness score from 1 (many errors) to 5 (fully consistent) with a one-paragraph justification.

Transcript:
{transcript}"#;

/// Prompt for judging the transcript's clinical plausibility on its own.
pub const PLAUSIBILITY: &str = r#"Below is a transcript of a multidisciplinary team (MDT) meeting.

Evaluate how PLAUSIBLE this transcript is as a real MDT discussion, independent of any source document:
- Are the participating roles appropriate, and does each speak within their expertise?
- Is the clinical reasoning coherent, and are the proposed investigations and treatments consistent with current standard practice?
- Is the flow of the meeting (presentation, discussion, decision, actions) realistic?
- Point out any dialogue that sounds artificial or any decision a real MDT would be unlikely to make.
- Give an overall plausibility score from 1 (implausible) to 5 (indistinguishable from a real MDT) with a one-paragraph justification.

Transcript:
{transcript}"#;

/// Substitute the transcript into a template.
pub fn render(template: &str, transcript: &str) -> String {
    template.replace(TRANSCRIPT_PLACEHOLDER, transcript)
}
