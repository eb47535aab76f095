//! Offline replies: short, explicit about being offline, locale-keyed.
//!
//! Questions and statements get different wording so the assistant does not
//! promise an answer it cannot give.

use crate::gateway::lexicon;

/// A concise offline message for `user_text` in `locale`.
pub(super) fn message(user_text: &str, locale: &str) -> &'static str {
    let question = user_text.trim_end().ends_with('?');
    match (lexicon::is_latvian(locale), question) {
        (true, true) => {
            "Pašlaik esmu bezsaistē, tāpēc nevaru sniegt pilnu atbildi. Pieslēdzot tīklu, mēģināšu atbildēt."
        }
        (true, false) => "Pašlaik esmu bezsaistē. Kad būs savienojums, varēšu palīdzēt precīzāk.",
        (false, true) => {
            "I’m currently offline, so I can’t provide a full answer. Once we’re online, I’ll try to answer."
        }
        (false, false) => "I’m offline right now. When connection is available, I’ll help more precisely.",
    }
}
