// ident.rs — Identifier validity for emitted names
//
// Every block, class, port, and argument name is spliced into the emitted
// declarations verbatim, so it must lex as a single identifier. Reserved
// words such as `in` are accepted; they only ever appear after `self.`.

/// True if `s` can be emitted as a bare identifier.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first == '_' || first.is_alphabetic()) {
        return false;
    }
    chars.all(|c| c == '_' || c.is_alphanumeric())
}
