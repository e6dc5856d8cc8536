//! Instruction templates and fixed replies per response language.

pub struct LanguagePack {
    pub code: &'static str,
    pub template: &'static str,
    pub insufficient_information: &'static str,
}

const ENGLISH: LanguagePack = LanguagePack {
    code: "en",
    template: "You are a helpful AI assistant. Use the following context to answer the question.
If the question is a general greeting (like \"hello\", \"hi\") or not directly related to the specific context provided, please answer politely using your general knowledge.
Do NOT say \"I cannot answer based on context\" for simple social interactions or general questions.

Context:
{context}

Question: {question}

Answer: ",
    insufficient_information: "I don't have enough information to answer this question.",
};

const INDONESIAN: LanguagePack = LanguagePack {
    code: "id",
    template: "Anda adalah asisten AI yang membantu. Gunakan konteks berikut untuk menjawab pertanyaan.
Jika pertanyaan adalah sapaan umum (seperti \"halo\", \"selamat pagi\") atau tidak terkait langsung dengan konteks yang diberikan, silakan jawab dengan sopan menggunakan pengetahuan umum Anda.
JANGAN katakan \"Saya tidak bisa menjawab berdasarkan konteks\" untuk interaksi sosial sederhana atau pertanyaan umum.

Konteks:
{context}

Pertanyaan: {question}

Jawaban: ",
    insufficient_information:
        "Maaf, saya tidak memiliki cukup informasi untuk menjawab pertanyaan ini.",
};

const PACKS: &[&LanguagePack] = &[&ENGLISH, &INDONESIAN];

fn lookup(code: &str) -> Option<&'static LanguagePack> {
    let code = code.trim().to_ascii_lowercase();
    PACKS.iter().copied().find(|p| p.code == code)
}

/// Resolve a requested language, falling back to `default` and finally to
/// Indonesian.
pub fn resolve(requested: Option<&str>, default: &str) -> &'static LanguagePack {
    requested
        .and_then(lookup)
        .or_else(|| lookup(default))
        .unwrap_or(&INDONESIAN)
}

/// Fixed reply when nothing is retrieved. Indonesian only when that is the
/// language asked for (or the default when none is given), English otherwise.
pub fn insufficient_information(requested: Option<&str>, default: &str) -> &'static str {
    let code = requested.unwrap_or(default).trim().to_ascii_lowercase();
    if code == INDONESIAN.code {
        INDONESIAN.insufficient_information
    } else {
        ENGLISH.insufficient_information
    }
}

impl LanguagePack {
    /// Fill the template. Placeholders inside the retrieved context are
    /// left untouched.
    pub fn render(&self, context: &str, question: &str) -> String {
        match self.template.split_once("{context}") {
            Some((head, tail)) => {
                format!("{}{}{}", head, context, tail.replace("{question}", question))
            }
            None => self.template.replace("{question}", question),
        }
    }
}
