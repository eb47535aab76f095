//! Canned phrases for turns that never reach a reasoning backend.
//!
//! Latvian (`lv-LV`) is the primary locale; every other locale tag gets the
//! English wording. The phrases are short, state plainly why no full answer
//! is available, and never contain user text.

/// True when `locale` selects the Latvian lexicon.
pub(super) fn is_latvian(locale: &str) -> bool {
    locale.eq_ignore_ascii_case("lv-LV")
}

/// Prompt was empty after normalization.
pub(super) fn didnt_catch(locale: &str) -> &'static str {
    if is_latvian(locale) {
        "Nesadzirdēju. Vari atkārtot?"
    } else {
        "I didn't catch that. Can you repeat?"
    }
}

/// The reasoning port produced nothing usable for this turn.
pub(super) fn cannot_answer(locale: &str) -> &'static str {
    if is_latvian(locale) {
        "Nevaru atbildēt šobrīd."
    } else {
        "I cannot answer right now."
    }
}

/// Online, but no reasoning port is configured.
pub(super) fn not_configured(user_text: &str, locale: &str) -> &'static str {
    let question = user_text.trim_end().ends_with('?');
    match (is_latvian(locale), question) {
        (true, true) => {
            "Domāšanas motors nav pieslēgts. Kad tas būs aktivizēts, došu pilnvērtīgu atbildi."
        }
        (true, false) => "Sapratu. Kad pieslēgsim domāšanas motoru, varēšu atbildēt saprātīgi.",
        (false, true) => "Reasoning engine not configured. Once enabled, I’ll provide a full answer.",
        (false, false) => "Got it. I’ll answer intelligently once the reasoning engine is connected.",
    }
}
