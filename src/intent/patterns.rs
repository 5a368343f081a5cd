//! Bilingual pattern tables for intent classification
//!
//! Tables are matched in declaration order and the first match wins. When
//! several actions match the same input the earlier row is kept even if a
//! later one fits better.

use super::DetectedAction;
use regex::Regex;
use std::sync::LazyLock;

/// One row of the action table
pub struct ActionPattern {
    pub action: DetectedAction,
    pub patterns: Vec<Regex>,
    pub confidence_base: f64,
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
}

pub static ACTION_PATTERNS: LazyLock<Vec<ActionPattern>> = LazyLock::new(|| {
    vec![
        ActionPattern {
            action: DetectedAction::AddField,
            patterns: compile(&[
                r"(加|添加|增加|新增).{0,12}(字段|属性|列)",
                r"(?i)\b(add|include|introduce)\b.*\b(field|column|property|attribute)\b",
            ]),
            confidence_base: 0.8,
        },
        ActionPattern {
            action: DetectedAction::RemoveField,
            patterns: compile(&[
                r"(删除|移除|去掉|删掉|去除).{0,12}(字段|属性|列)",
                r"(?i)\b(remove|delete|drop)\b.*\b(field|column|property|attribute)\b",
            ]),
            confidence_base: 0.8,
        },
        ActionPattern {
            action: DetectedAction::AddValidation,
            patterns: compile(&[
                r"(验证|校验|必填|格式检查)",
                r"(?i)\b(validat\w*|required|constraint|sanitiz\w*)\b",
            ]),
            confidence_base: 0.75,
        },
        ActionPattern {
            action: DetectedAction::CreateApi,
            patterns: compile(&[
                r"(?i)(创建|新建|添加|增加|写).{0,12}(接口|api|端点|路由)",
                r"(?i)\b(create|add|build|make|expose|new)\b.*\b(api|endpoint|route|procedure|mutation)\b",
            ]),
            confidence_base: 0.7,
        },
        ActionPattern {
            action: DetectedAction::CreateUi,
            patterns: compile(&[
                r"(?i)(创建|新建|添加|做|写).{0,12}(页面|界面|组件|表单|ui)",
                r"(?i)\b(create|add|build|make|new)\b.*\b(page|component|form|ui|screen|view)\b",
            ]),
            confidence_base: 0.7,
        },
    ]
});

/// Identifier following a Chinese preposition (`给User...`)
pub static ZH_PREPOSITION_ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[给为在对从]\s*([A-Za-z][A-Za-z0-9_]*)").expect("valid regex")
});

/// Chinese prepositions, for synonym lookups on the text that follows
pub static ZH_PREPOSITION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[给为在对从]\s*").expect("valid regex"));

/// `to/from/for/on/in [the] X`
pub static EN_PREPOSITION_ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:to|from|for|on|in)\s+(?:the\s+|a\s+|an\s+)?([A-Za-z][A-Za-z0-9_]*)")
        .expect("valid regex")
});

pub static PASCAL_CASE_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Z][a-z0-9]+(?:[A-Z][a-z0-9]+)*)\b").expect("valid regex")
});

/// `add [a|an|the|new] <field> field`
pub static EN_FIELD_FALLBACK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\badd\s+(?:(?:a|an|the|new)\s+)*([A-Za-z][A-Za-z0-9_]*)\s+(?:field|column|property|attribute)\b",
    )
    .expect("valid regex")
});

/// `加一个<field>字段`
pub static ZH_FIELD_FALLBACK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:加|添加|增加|新增)\s*(?:一个|个)?\s*([A-Za-z][A-Za-z0-9_]*)\s*(?:字段|属性|列)")
        .expect("valid regex")
});

/// Words never taken from a preposition or capitalization capture.
/// `order` is here because of "in order to"; it still resolves through the synonym scan.
pub const ENTITY_STOP_WORDS: &[&str] = &[
    "a", "an", "the", "this", "that", "it", "my", "our", "add", "remove", "delete", "drop",
    "create", "build", "make", "update", "where", "how", "what", "which", "find", "show",
    "include", "please", "validate", "validation", "field", "fields", "column", "api", "ui",
    "page", "form", "new", "order", "i",
];

/// Surface form -> canonical entity name
pub const ENTITY_SYNONYMS: &[(&str, &str)] = &[
    ("用户", "User"),
    ("user", "User"),
    ("users", "User"),
    ("账户", "Account"),
    ("账号", "Account"),
    ("account", "Account"),
    ("产品", "Product"),
    ("商品", "Product"),
    ("product", "Product"),
    ("products", "Product"),
    ("订单", "Order"),
    ("order", "Order"),
    ("orders", "Order"),
    ("支付", "Payment"),
    ("付款", "Payment"),
    ("payment", "Payment"),
    ("文章", "Post"),
    ("帖子", "Post"),
    ("post", "Post"),
    ("评论", "Comment"),
    ("comment", "Comment"),
    ("分类", "Category"),
    ("类别", "Category"),
    ("category", "Category"),
    ("标签", "Tag"),
    ("tag", "Tag"),
    ("客户", "Customer"),
    ("customer", "Customer"),
    ("团队", "Team"),
    ("team", "Team"),
    ("项目", "Project"),
    ("project", "Project"),
    ("发票", "Invoice"),
    ("invoice", "Invoice"),
    ("会话", "Session"),
    ("session", "Session"),
];

/// Surface form -> canonical field name
pub const FIELD_SYNONYMS: &[(&str, &str)] = &[
    ("出生日期", "birthday"),
    ("生日", "birthday"),
    ("年龄", "age"),
    ("手机号码", "phone"),
    ("手机号", "phone"),
    ("手机", "phone"),
    ("电话号码", "phone"),
    ("电话", "phone"),
    ("电子邮件", "email"),
    ("邮箱", "email"),
    ("地址", "address"),
    ("姓名", "name"),
    ("名字", "name"),
    ("名称", "name"),
    ("昵称", "nickname"),
    ("头像", "avatar"),
    ("密码", "password"),
    ("性别", "gender"),
    ("价格", "price"),
    ("金额", "amount"),
    ("描述", "description"),
    ("简介", "bio"),
    ("状态", "status"),
    ("数量", "quantity"),
    ("库存", "stock"),
    ("标题", "title"),
    ("内容", "content"),
    ("备注", "notes"),
    ("网址", "url"),
    ("链接", "url"),
    ("创建时间", "createdAt"),
    ("更新时间", "updatedAt"),
    ("birthday", "birthday"),
    ("birth date", "birthday"),
    ("date of birth", "birthday"),
    ("age", "age"),
    ("phone number", "phone"),
    ("phone", "phone"),
    ("mobile", "phone"),
    ("email address", "email"),
    ("email", "email"),
    ("address", "address"),
    ("nickname", "nickname"),
    ("avatar", "avatar"),
    ("password", "password"),
    ("gender", "gender"),
    ("price", "price"),
    ("amount", "amount"),
    ("description", "description"),
    ("bio", "bio"),
    ("status", "status"),
    ("quantity", "quantity"),
    ("stock", "stock"),
    ("title", "title"),
];

fn is_ascii_key(key: &str) -> bool {
    key.is_ascii()
}

/// Whether `key` occurs in `lower` as a whole word
fn contains_word(lower: &str, key: &str) -> bool {
    lower.match_indices(key).any(|(start, _)| {
        let before = lower[..start].chars().next_back();
        let after = lower[start + key.len()..].chars().next();
        let boundary = |c: Option<char>| c.map_or(true, |c| !c.is_ascii_alphanumeric() && c != '_');
        boundary(before) && boundary(after)
    })
}

/// Canonical entity for a surface form, if it is in the synonym table
pub fn canonical_entity(word: &str) -> Option<&'static str> {
    let lower = word.to_lowercase();
    ENTITY_SYNONYMS
        .iter()
        .find(|(key, _)| *key == lower)
        .map(|(_, canonical)| *canonical)
}

/// Canonical entity whose Chinese key starts `text`
pub fn entity_prefix(text: &str) -> Option<&'static str> {
    ENTITY_SYNONYMS
        .iter()
        .filter(|(key, _)| !is_ascii_key(key) && text.starts_with(key))
        .max_by_key(|(key, _)| key.chars().count())
        .map(|(_, canonical)| *canonical)
}

/// First entity synonym mentioned anywhere in the text
pub fn scan_entity(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    ENTITY_SYNONYMS
        .iter()
        .find(|(key, _)| {
            if is_ascii_key(key) {
                contains_word(&lower, key)
            } else {
                text.contains(key)
            }
        })
        .map(|(_, canonical)| *canonical)
}

/// Canonical field named in the text. The longest Chinese key wins, then
/// the longest English key.
pub fn scan_field(text: &str) -> Option<&'static str> {
    let zh = FIELD_SYNONYMS
        .iter()
        .filter(|(key, _)| !is_ascii_key(key) && text.contains(key))
        .max_by_key(|(key, _)| key.chars().count());
    if let Some((_, canonical)) = zh {
        return Some(*canonical);
    }

    let lower = text.to_lowercase();
    FIELD_SYNONYMS
        .iter()
        .filter(|(key, _)| is_ascii_key(key) && contains_word(&lower, key))
        .max_by_key(|(key, _)| key.len())
        .map(|(_, canonical)| *canonical)
}

/// Canonical field for a surface form, if it is in the synonym table
pub fn canonical_field(word: &str) -> Option<&'static str> {
    let lower = word.to_lowercase();
    FIELD_SYNONYMS
        .iter()
        .find(|(key, _)| *key == lower)
        .map(|(_, canonical)| *canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_table_order() {
        let order: Vec<DetectedAction> = ACTION_PATTERNS.iter().map(|p| p.action).collect();
        assert_eq!(
            order,
            vec![
                DetectedAction::AddField,
                DetectedAction::RemoveField,
                DetectedAction::AddValidation,
                DetectedAction::CreateApi,
                DetectedAction::CreateUi,
            ]
        );
    }

    #[test]
    fn test_longest_chinese_field_key_wins() {
        assert_eq!(scan_field("给用户加手机号码字段"), Some("phone"));
        assert_eq!(scan_field("添加出生日期"), Some("birthday"));
        assert_eq!(scan_field("add a phone number"), Some("phone"));
        assert_eq!(scan_field("nothing here"), None);
    }

    #[test]
    fn test_entity_lookups() {
        assert_eq!(canonical_entity("USERS"), Some("User"));
        assert_eq!(entity_prefix("商品加一个价格字段"), Some("Product"));
        assert_eq!(scan_entity("add stock to every product"), Some("Product"));
        assert_eq!(scan_entity("superuser settings"), None);
    }

    #[test]
    fn test_contains_word_boundaries() {
        assert!(contains_word("the user table", "user"));
        assert!(!contains_word("the users_v2 table", "user"));
        assert!(contains_word("user", "user"));
    }
}
