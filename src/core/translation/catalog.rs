//! 手语词表：SignId → 法语显示文本

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::detection::SignId;

/// 模型类别顺序（YOLO class index → SignId）
pub const SIGN_CLASSES: [&str; 30] = [
    "bonjour",
    "merci",
    "au_revoir",
    "oui",
    "non",
    "s_il_vous_plait",
    "excusez_moi",
    "comment",
    "ou",
    "quand",
    "pourquoi",
    "qui",
    "eau",
    "manger",
    "boire",
    "dormir",
    "travail",
    "maison",
    "famille",
    "ami",
    "amour",
    "heureux",
    "triste",
    "colere",
    "peur",
    "surprise",
    "aide",
    "stop",
    "attention",
    "danger",
];

static CATALOG: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("bonjour", "Bonjour"),
        ("merci", "Merci"),
        ("au_revoir", "Au revoir"),
        ("oui", "Oui"),
        ("non", "Non"),
        ("s_il_vous_plait", "S'il vous plaît"),
        ("excusez_moi", "Excusez-moi"),
        ("comment", "Comment"),
        ("ou", "Où"),
        ("quand", "Quand"),
        ("pourquoi", "Pourquoi"),
        ("qui", "Qui"),
        ("eau", "Eau"),
        ("manger", "Manger"),
        ("boire", "Boire"),
        ("dormir", "Dormir"),
        ("travail", "Travail"),
        ("maison", "Maison"),
        ("famille", "Famille"),
        ("ami", "Ami"),
        ("amour", "Amour"),
        ("heureux", "Heureux"),
        ("triste", "Triste"),
        ("colere", "Colère"),
        ("peur", "Peur"),
        ("surprise", "Surprise"),
        ("aide", "Aide"),
        ("stop", "Stop"),
        ("attention", "Attention"),
        ("danger", "Danger"),
    ])
});

/// Map a model class index to its sign id. Indices past the catalog become their decimal string.
pub fn class_label(class_index: usize) -> SignId {
    SIGN_CLASSES
        .get(class_index)
        .map(|id| SignId::from(*id))
        .unwrap_or_else(|| SignId::new(class_index.to_string()))
}

/// 词表翻译器
///
/// 未知的 SignId 原样输出，不报错。
#[derive(Debug, Clone, Default)]
pub struct LabelTranslator {
    overrides: HashMap<String, String>,
}

impl LabelTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 配置中的自定义显示文本优先于内置词表
    pub fn with_overrides(overrides: HashMap<String, String>) -> Self {
        Self { overrides }
    }

    pub fn translate<'a>(&'a self, sign: &'a SignId) -> &'a str {
        let id = sign.as_str();
        if let Some(text) = self.overrides.get(id) {
            return text;
        }
        CATALOG.get(id).copied().unwrap_or(id)
    }

    pub fn translate_sequence(&self, sequence: &[SignId]) -> Vec<String> {
        sequence
            .iter()
            .map(|sign| self.translate(sign).to_string())
            .collect()
    }

    pub fn is_known(&self, sign: &SignId) -> bool {
        self.overrides.contains_key(sign.as_str()) || CATALOG.contains_key(sign.as_str())
    }

    pub fn catalog_size() -> usize {
        CATALOG.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_sign() {
        let translator = LabelTranslator::new();
        assert_eq!(translator.translate(&SignId::from("bonjour")), "Bonjour");
        assert_eq!(translator.translate(&SignId::from("s_il_vous_plait")), "S'il vous plaît");
        assert_eq!(translator.translate(&SignId::from("colere")), "Colère");
    }

    #[test]
    fn test_unknown_sign_passes_through() {
        let translator = LabelTranslator::new();
        let unknown = SignId::from("xyz123");

        assert_eq!(translator.translate(&unknown), "xyz123");
        assert!(!translator.is_known(&unknown));
    }

    #[test]
    fn test_catalog_covers_every_class() {
        assert_eq!(LabelTranslator::catalog_size(), SIGN_CLASSES.len());

        let translator = LabelTranslator::new();
        for id in SIGN_CLASSES {
            assert!(translator.is_known(&SignId::from(id)), "missing {}", id);
        }
    }

    #[test]
    fn test_overrides_take_precedence() {
        let overrides = HashMap::from([
            ("merci".to_string(), "Merci beaucoup".to_string()),
            ("salut".to_string(), "Salut".to_string()),
        ]);
        let translator = LabelTranslator::with_overrides(overrides);

        assert_eq!(translator.translate(&SignId::from("merci")), "Merci beaucoup");
        assert_eq!(translator.translate(&SignId::from("salut")), "Salut");
        assert_eq!(translator.translate(&SignId::from("oui")), "Oui");
    }

    #[test]
    fn test_translate_sequence_keeps_order() {
        let translator = LabelTranslator::new();
        let sequence = vec![SignId::from("oui"), SignId::from("non"), SignId::from("oui")];

        assert_eq!(translator.translate_sequence(&sequence), vec!["Oui", "Non", "Oui"]);
    }

    #[test]
    fn test_class_label() {
        assert_eq!(class_label(0), SignId::from("bonjour"));
        assert_eq!(class_label(29), SignId::from("danger"));
        assert_eq!(class_label(42), SignId::from("42"));
    }
}
