use talapker_common::Language;

/// Bilingual prompt shown after `/start`.
pub const LANGUAGE_PROMPT: &str = "Тілді таңдаңыз / Выберите язык:";

pub const HELP: &str = "Выберите язык и раздел. Напишите вопрос, и я отвечу.";

/// Fixed replies for one language.
#[derive(Debug)]
pub struct Texts {
    pub menu_prompt: &'static str,
    /// Content lookup failed.
    pub content_unavailable: &'static str,
    /// Nothing in the pipeline produced an answer.
    pub not_understood: &'static str,
    /// Casual chat while the advisor is down.
    pub casual_fallback: &'static str,
    /// Stand-in for an empty generated answer.
    pub empty_answer: &'static str,
    /// Replaces a generated answer that failed the content filter.
    pub redirect: &'static str,
    /// Leading system turn sent with the history to the generator.
    pub system_instruction: &'static str,
}

static KZ: Texts = Texts {
    menu_prompt: "Бөлімді таңдаңыз:",
    content_unavailable: "Деректер жақында жаңартылады.",
    not_understood: "Сұрағыңды түсінбедім. Мәзірден таңда немесе қысқаша жаз. Қолжетімді бөлімдер: бағдарламалар, құжаттар, гранттар, жатақхана.",
    casual_fallback: "Сәлем! WKATU бойынша не керек: қабылдау, бағдарламалар, гранттар, жатақхана?",
    empty_answer: "WKATU бойынша көмектесемін: қабылдау, бағдарламалар, гранттар, жатақхана. Не қызықтырады?",
    redirect: "Келіңіз, WKATU-ға түсу тақырыбына оралайық: бағдарламалар, құжаттар, гранттар, жатақхана.",
    system_instruction: "Сен TalapkerBot WKATU көмекшісісің. ҚОЛДАНУШЫ ҚАЗАҚША ЖАЗСА, ҚАЗАҚША ЖАУАП БЕР. Қысқа және нақты жауап бер. Университет жайлы факті ойдан қоспа.",
};

static RU: Texts = Texts {
    menu_prompt: "Выберите раздел:",
    content_unavailable: "Данные скоро обновим.",
    not_understood: "Не понял. Выберите пункт меню или сформулируйте короче. Доступные разделы: программы, документы, гранты, общежитие.",
    casual_fallback: "Привет! Чем помочь по WKATU: поступление, программы, гранты, общага?",
    empty_answer: "Помогу по WKATU: поступление, программы, гранты, общежитие. Что интересно?",
    redirect: "Давайте вернёмся к теме поступления в WKATU: программы, документы, гранты, общежитие.",
    system_instruction: "Ты помощник TalapkerBot WKATU. ОТВЕЧАЙ НА ТОМ ЖЕ ЯЗЫКЕ, ЧТО И ПОЛЬЗОВАТЕЛЬ (рус/каз). Отвечай кратко и по делу. Не выдумывай факты об университете.",
};

#[must_use]
pub fn texts(language: Language) -> &'static Texts {
    match language {
        Language::Kz => &KZ,
        Language::Ru => &RU,
    }
}
