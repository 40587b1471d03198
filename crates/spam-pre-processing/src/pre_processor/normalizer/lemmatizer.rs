use std::borrow::Cow;

use ahash::{HashMap, HashSet};

use super::{stopwords::StopWords, word_list};

static ENGLISH_LEXICON: &str = include_str!("../../../data/lemma_lexicon.txt");
static ENGLISH_EXCEPTIONS: &str = include_str!("../../../data/lemma_exceptions.txt");

/// A suffix detachment rule: strip `suffix`, append `replacement`.
struct Rule {
    suffix: &'static str,
    replacement: &'static str,
    /// Also try the stem with a doubled final consonant reduced (`runn` -> `run`).
    undouble: bool,
}

const fn rule(suffix: &'static str, replacement: &'static str, undouble: bool) -> Rule {
    Rule {
        suffix,
        replacement,
        undouble,
    }
}

/// Noun, then verb, then adjective rules. The first candidate found in the lexicon wins.
const RULES: &[Rule] = &[
    // nouns
    rule("s", "", false),
    rule("ses", "s", false),
    rule("xes", "x", false),
    rule("zes", "z", false),
    rule("ches", "ch", false),
    rule("shes", "sh", false),
    rule("men", "man", false),
    rule("ies", "y", false),
    // verbs
    rule("ies", "y", false),
    rule("ied", "y", false),
    rule("es", "e", false),
    rule("es", "", false),
    rule("ed", "e", false),
    rule("ed", "", true),
    rule("ing", "e", false),
    rule("ing", "", true),
    // adjectives
    rule("ier", "y", false),
    rule("iest", "y", false),
    rule("er", "", true),
    rule("est", "", true),
    rule("er", "e", false),
    rule("est", "e", false),
];

/// Dictionary lemmatizer: a lexicon of base forms, an irregular-form table
/// and suffix detachment rules validated against the lexicon.
///
/// The embedded English tables follow WordNet's layout: a list of base forms
/// plus the irregular noun, verb and adjective inflections that no suffix
/// rule can reach (`wolves`, `bought`, `worse`). Tokens it cannot resolve are
/// returned unchanged.
#[derive(Clone, Debug, Default)]
pub struct Lemmatizer {
    lexicon: HashSet<String>,
    exceptions: HashMap<String, String>,
}

impl Lemmatizer {
    /// The embedded English tables.
    #[must_use]
    pub fn english() -> Self {
        let exceptions = word_list(ENGLISH_EXCEPTIONS).filter_map(|line| {
            let mut parts = line.split_whitespace();
            Some((parts.next()?, parts.next()?))
        });
        Self::new(word_list(ENGLISH_LEXICON), exceptions)
    }

    /// Build a lemmatizer from base forms and `(inflected, base)` pairs.
    /// Every exception target becomes part of the lexicon.
    pub fn new<L, E, S, T>(lexicon: L, exceptions: E) -> Self
    where
        L: IntoIterator<Item = S>,
        E: IntoIterator<Item = (T, T)>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let mut lexicon = lexicon
            .into_iter()
            .map(|word| word.as_ref().to_lowercase())
            .collect::<HashSet<_>>();
        let exceptions = exceptions
            .into_iter()
            .map(|(inflected, base)| {
                (
                    inflected.as_ref().to_lowercase(),
                    base.as_ref().to_lowercase(),
                )
            })
            .collect::<HashMap<_, _>>();
        lexicon.extend(exceptions.values().cloned());
        Self {
            lexicon,
            exceptions,
        }
    }

    /// Passes every token through unchanged.
    #[must_use]
    pub fn identity() -> Self {
        Self::default()
    }

    /// Drop every base form that is itself a stopword, so a lemma can never
    /// reintroduce a token the stopword pass removes.
    #[must_use]
    pub(crate) fn without_stopwords(mut self, stopwords: &StopWords) -> Self {
        self.lexicon.retain(|word| !stopwords.contains(word));
        let lexicon = &self.lexicon;
        self.exceptions
            .retain(|_, base| lexicon.contains(base.as_str()));
        self
    }

    pub fn lemmatize<'a>(&self, token: &'a str) -> Cow<'a, str> {
        if self.lexicon.contains(token) {
            return Cow::Borrowed(token);
        }
        if let Some(base) = self.exceptions.get(token) {
            return Cow::Owned(base.clone());
        }
        self.detach(token).map_or(Cow::Borrowed(token), Cow::Owned)
    }

    fn detach(&self, token: &str) -> Option<String> {
        for rule in RULES {
            let Some(stem) = token.strip_suffix(rule.suffix) else {
                continue;
            };
            if stem.is_empty() {
                continue;
            }
            let candidate = format!("{stem}{}", rule.replacement);
            if self.lexicon.contains(&candidate) {
                return Some(candidate);
            }
            if rule.undouble {
                if let Some(undoubled) = undouble(stem) {
                    if self.lexicon.contains(undoubled) {
                        return Some(undoubled.to_string());
                    }
                }
            }
        }
        None
    }

    /// Number of known base forms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lexicon.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lexicon.is_empty() && self.exceptions.is_empty()
    }
}

fn undouble(stem: &str) -> Option<&str> {
    let bytes = stem.as_bytes();
    match bytes {
        [.., a, b] if a == b && a.is_ascii_alphabetic() && !b"aeiou".contains(a) => {
            Some(&stem[..stem.len() - 1])
        }
        _ => None,
    }
}
