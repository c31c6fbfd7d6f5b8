//! A line-preserving structured view of `models.py` text as printed by
//! Django's `inspectdb`.

mod field;

pub use field::*;

/// Line prefix that opens a model declaration
const CLASS_KEYWORD: &str = "class ";

/// Extract the declared entity names, in order of first appearance.
///
/// A declaration starts with `class ` at the beginning of a line, and its
/// name is the next token up to its first `(`. Names are not deduplicated.
pub fn extract_entity_names(text: &str) -> Vec<String> {
    text.lines().filter_map(declared_name).collect()
}

fn declared_name(line: &str) -> Option<String> {
    if !line.starts_with(CLASS_KEYWORD) {
        return None;
    }
    let token = line.split_whitespace().nth(1)?;
    token.split('(').next().map(str::to_owned)
}

/// Parsed `models.py` text. Renders back to the exact text it was parsed
/// from unless modified.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReflectedModule {
    pub items: Vec<ModuleItem>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModuleItem {
    /// Any top level line outside a model declaration
    Raw(String),
    Model(ModelDecl),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelDecl {
    pub name: String,
    /// The `class Name(bases):` line
    pub header: String,
    pub body: Vec<BodyLine>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BodyLine {
    Field(FieldDecl),
    Raw(String),
}

impl ReflectedModule {
    pub fn parse(text: &str) -> Self {
        let mut items = Vec::new();
        let mut lines = text.split('\n').peekable();

        while let Some(line) = lines.next() {
            let Some(name) = declared_name(line) else {
                items.push(ModuleItem::Raw(line.to_owned()));
                continue;
            };

            let mut body = Vec::new();
            let mut blanks = Vec::new();
            while let Some(next) = lines.peek() {
                if next.trim().is_empty() {
                    blanks.push(next.to_string());
                } else if next.starts_with([' ', '\t']) {
                    body.extend(blanks.drain(..).map(BodyLine::Raw));
                    body.push(BodyLine::parse(next));
                } else {
                    break;
                }
                lines.next();
            }

            items.push(ModuleItem::Model(ModelDecl {
                name,
                header: line.to_owned(),
                body,
            }));
            // blank lines after the last body line separate declarations
            items.extend(blanks.into_iter().map(ModuleItem::Raw));
        }

        Self { items }
    }

    pub fn render(&self) -> String {
        self.items
            .iter()
            .map(ModuleItem::render)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn models(&self) -> impl Iterator<Item = &ModelDecl> {
        self.items.iter().filter_map(|item| match item {
            ModuleItem::Model(model) => Some(model),
            ModuleItem::Raw(_) => None,
        })
    }

    /// Top level `import` and `from ... import` lines
    pub fn imports(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|item| match item {
            ModuleItem::Raw(line) if is_import(line) => Some(line.as_str()),
            _ => None,
        })
    }

    /// Mark the synthetic id of every model as its primary key
    pub fn mark_primary_keys(&mut self) -> usize {
        let mut marked = 0;
        for item in &mut self.items {
            if let ModuleItem::Model(model) = item {
                if model.mark_primary_key() {
                    marked += 1;
                }
            }
        }
        marked
    }
}

impl ModuleItem {
    pub fn render(&self) -> String {
        match self {
            Self::Raw(line) => line.clone(),
            Self::Model(model) => model.render(),
        }
    }
}

impl ModelDecl {
    pub fn fields(&self) -> impl Iterator<Item = &FieldDecl> {
        self.body.iter().filter_map(|line| match line {
            BodyLine::Field(field) => Some(field),
            BodyLine::Raw(_) => None,
        })
    }

    /// Mark the first unmarked `dna_id = models.Int32Field()` as primary key.
    /// Returns whether a field was changed.
    pub fn mark_primary_key(&mut self) -> bool {
        let field = self.body.iter_mut().find_map(|line| match line {
            BodyLine::Field(field) if field.is_unmarked_synthetic_id() => Some(field),
            _ => None,
        });
        match field {
            Some(field) => {
                field.set_primary_key();
                true
            }
            None => false,
        }
    }

    pub fn render(&self) -> String {
        std::iter::once(self.header.clone())
            .chain(self.body.iter().map(BodyLine::render))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl BodyLine {
    fn parse(line: &str) -> Self {
        match FieldDecl::parse(line) {
            Some(field) => Self::Field(field),
            None => Self::Raw(line.to_owned()),
        }
    }

    pub fn render(&self) -> String {
        match self {
            Self::Field(field) => field.render(),
            Self::Raw(line) => line.clone(),
        }
    }
}

pub(crate) fn is_import(line: &str) -> bool {
    line.starts_with("import ") || (line.starts_with("from ") && line.contains(" import "))
}
