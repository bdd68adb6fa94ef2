pub const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

pub fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut prev = '\0';

    for ch in sql.chars() {
        match ch {
            '\'' if !in_double_quote && prev != '\\' => {
                in_single_quote = !in_single_quote;
            }
            '"' if !in_single_quote => {
                in_double_quote = !in_double_quote;
            }
            ';' if !in_single_quote && !in_double_quote => {
                let stmt = current.trim();
                if !stmt.is_empty() {
                    statements.push(stmt.to_string());
                }
                current.clear();
                prev = ch;
                continue;
            }
            _ => {}
        }

        current.push(ch);
        prev = ch;
    }

    let tail = current.trim();
    if !tail.is_empty() {
        statements.push(tail.to_string());
    }

    statements
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_splits_into_statements() {
        let statements = split_sql_statements(SCHEMA_SQL);
        assert!(statements.len() >= 4);
        assert!(statements
            .iter()
            .any(|s| s.contains("\"topic_schedule\"")));
    }

    #[test]
    fn test_semicolon_inside_quotes_kept() {
        let statements = split_sql_statements("INSERT INTO t VALUES ('a;b'); SELECT 1");
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("a;b"));
    }
}
