/// Name of the synthetic id column every provisioned table starts with
pub const SYNTHETIC_ID: &str = "dna_id";

const SYNTHETIC_ID_FIELD: &str = "models.Int32Field";
const PRIMARY_KEY_ARG: &str = "primary_key=True";

/// A model attribute of the form `name = models.Type(args)`, with whatever
/// surrounds it kept for rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDecl {
    pub indent: String,
    pub name: String,
    /// e.g. `models.CharField`
    pub field_type: String,
    pub args: String,
    /// Text after the closing parenthesis, usually an inspectdb comment
    pub trailing: String,
    pub is_primary_key: bool,
}

impl FieldDecl {
    pub fn parse(line: &str) -> Option<Self> {
        let decl = line.trim_start();
        let indent = &line[..line.len() - decl.len()];
        if indent.is_empty() {
            return None;
        }
        let (name, rhs) = decl.split_once(" = ")?;
        let (field_type, rest) = rhs.split_once('(')?;
        if !is_identifier(name)
            || !field_type.starts_with("models.")
            || !field_type.split('.').all(is_identifier)
        {
            return None;
        }
        let close = closing_paren(rest)?;
        let args = &rest[..close];
        let trailing = &rest[close + 1..];
        if !(trailing.trim().is_empty() || trailing.trim_start().starts_with('#')) {
            return None;
        }

        Some(Self {
            indent: indent.to_owned(),
            name: name.to_owned(),
            field_type: field_type.to_owned(),
            args: args.to_owned(),
            trailing: trailing.to_owned(),
            is_primary_key: args.contains(PRIMARY_KEY_ARG),
        })
    }

    pub fn render(&self) -> String {
        format!(
            "{}{} = {}({}){}",
            self.indent, self.name, self.field_type, self.args, self.trailing
        )
    }

    /// Exactly `dna_id = models.Int32Field()`
    pub fn is_unmarked_synthetic_id(&self) -> bool {
        self.name == SYNTHETIC_ID
            && self.field_type == SYNTHETIC_ID_FIELD
            && self.args.is_empty()
            && !self.is_primary_key
    }

    pub fn set_primary_key(&mut self) {
        if self.is_primary_key {
            return;
        }
        if self.args.trim().is_empty() {
            self.args = PRIMARY_KEY_ARG.to_owned();
        } else {
            self.args = format!("{}, {PRIMARY_KEY_ARG}", self.args);
        }
        self.is_primary_key = true;
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_alphabetic())
        && chars.all(|c| c == '_' || c.is_alphanumeric())
}

/// Byte offset of the `)` closing an argument list whose `(` was just
/// consumed, skipping parentheses inside string literals
fn closing_paren(args: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote = None;
    let mut escaped = false;
    for (i, c) in args.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' => depth += 1,
            ')' if depth == 0 => return Some(i),
            ')' => depth -= 1,
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_field() {
        let line = "    price = models.DecimalField(max_digits=10, decimal_places=2)  # guess (maybe)";
        let field = FieldDecl::parse(line).unwrap();
        assert_eq!(field.name, "price");
        assert_eq!(field.field_type, "models.DecimalField");
        assert_eq!(field.args, "max_digits=10, decimal_places=2");
        assert_eq!(field.trailing, "  # guess (maybe)");
        assert!(!field.is_primary_key);
        assert_eq!(field.render(), line);
    }

    #[test]
    fn test_parse_quoted_parens() {
        let line = "    note = models.CharField(db_column='a)b', max_length=5)";
        let field = FieldDecl::parse(line).unwrap();
        assert_eq!(field.args, "db_column='a)b', max_length=5");
        assert_eq!(field.render(), line);
    }

    #[test]
    fn test_not_a_field() {
        for line in [
            "dna_id = models.Int32Field()",
            "        managed = False",
            "        db_table = 'alpha'",
            "    objects = Manager()",
            "    x = models.IntegerField() + 1",
        ] {
            assert_eq!(FieldDecl::parse(line), None, "{line}");
        }
    }

    #[test]
    fn test_set_primary_key() {
        let mut field = FieldDecl::parse("    dna_id = models.Int32Field()").unwrap();
        assert!(field.is_unmarked_synthetic_id());
        field.set_primary_key();
        assert_eq!(field.render(), "    dna_id = models.Int32Field(primary_key=True)");
        assert!(!field.is_unmarked_synthetic_id());

        let mut field = FieldDecl::parse("    id = models.IntegerField(db_column='ID')").unwrap();
        field.set_primary_key();
        assert_eq!(
            field.render(),
            "    id = models.IntegerField(db_column='ID', primary_key=True)"
        );
    }
}
