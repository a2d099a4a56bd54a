//! Raw predicate fragments with positional arguments

use crate::{Error, IntoArgs, Result, Value};

/// One raw SQL template and the arguments for its `?` placeholders
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub template: String,
    pub args: Vec<Value>,
}

impl Predicate {
    pub fn new<A>(template: impl Into<String>, args: A) -> Self
    where
        A: IntoArgs,
    {
        Self {
            template: template.into(),
            args: args.into_args(),
        }
    }

    /// Check that the template is non-empty and its placeholder count
    /// matches the argument count
    pub fn check(&self) -> Result<()> {
        if self.template.trim().is_empty() {
            return Err(Error::invalid_query("predicate template is empty"));
        }
        let placeholders = count_placeholders(&self.template);
        if placeholders != self.args.len() {
            return Err(Error::malformed_predicate(
                &self.template,
                placeholders,
                self.args.len(),
            ));
        }
        Ok(())
    }
}

/// Accumulated WHERE predicates, combined with `AND` in append order.
///
/// Templates are inserted verbatim. A template containing `OR` should be
/// parenthesized by the caller, otherwise it binds looser than the `AND`
/// joining it to its neighbours.
///
/// # Examples
/// ```
/// use tabula_core::Fragment;
///
/// let (sql, args) = Fragment::new()
///     .where_("done = ?", false)
///     .where_("user_id = ?", 7)
///     .compile()
///     .unwrap();
/// assert_eq!(sql, "done = ? AND user_id = ?");
/// assert_eq!(args.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    predicates: Vec<Predicate>,
}

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a predicate template. Placeholder/argument agreement is
    /// checked by [`Fragment::compile`], not here.
    pub fn where_<A>(mut self, template: impl Into<String>, args: A) -> Self
    where
        A: IntoArgs,
    {
        self.predicates.push(Predicate::new(template, args));
        self
    }

    /// AND-join another fragment's predicates after this one's
    pub fn merge(mut self, other: Fragment) -> Self {
        self.predicates.extend(other.predicates);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Render the predicates joined with ` AND ` plus their arguments in the
    /// same order. An empty fragment compiles to an empty string.
    pub fn compile(&self) -> Result<(String, Vec<Value>)> {
        let mut parts = Vec::with_capacity(self.predicates.len());
        let mut args = Vec::new();
        for predicate in &self.predicates {
            predicate.check()?;
            parts.push(predicate.template.as_str());
            args.extend(predicate.args.iter().cloned());
        }
        Ok((parts.join(" AND "), args))
    }

    /// Append ` WHERE <predicates>` to `sql` unless the fragment is empty
    pub(crate) fn render_where(&self, sql: &mut String, args: &mut Vec<Value>) -> Result<()> {
        let (text, fragment_args) = self.compile()?;
        if !text.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&text);
            args.extend(fragment_args);
        }
        Ok(())
    }
}

/// Count `?` placeholders outside quoted literals and identifiers
pub(crate) fn count_placeholders(template: &str) -> usize {
    let mut count = 0;
    let mut quote: Option<char> = None;
    for c in template.chars() {
        match (quote, c) {
            (None, '\'' | '"') => quote = Some(c),
            (Some(open), _) if c == open => quote = None,
            (None, '?') => count += 1,
            _ => {}
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_fragment_compiles_to_nothing() {
        let (sql, args) = Fragment::new().compile().unwrap();
        assert_eq!(sql, "");
        assert!(args.is_empty());

        let mut sql = String::from("DELETE FROM todos");
        let mut args = Vec::new();
        Fragment::new().render_where(&mut sql, &mut args).unwrap();
        assert_eq!(sql, "DELETE FROM todos");
    }

    #[test]
    fn test_predicates_joined_in_order() {
        let fragment = Fragment::new()
            .where_("id > ?", 3)
            .where_("title = ?", "milk")
            .where_("done", ());
        let (sql, args) = fragment.compile().unwrap();
        assert_eq!(sql, "id > ? AND title = ? AND done");
        assert_eq!(args, vec![Value::I32(3), Value::String("milk".into())]);
    }

    #[test]
    fn test_merge_appends() {
        let left = Fragment::new().where_("a = ?", 1);
        let right = Fragment::new().where_("b = ?", 2);
        let (sql, args) = left.merge(right).compile().unwrap();
        assert_eq!(sql, "a = ? AND b = ?");
        assert_eq!(args, vec![Value::I32(1), Value::I32(2)]);
    }

    #[test]
    fn test_placeholder_mismatch_detected_at_compile() {
        // building never fails
        let fragment = Fragment::new().where_("id = ? AND title = ?", 1);
        let err = fragment.compile().unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedPredicate {
                placeholders: 2,
                arguments: 1,
                ..
            }
        ));

        let err = Fragment::new().where_("id = 1", 1).compile().unwrap_err();
        assert!(matches!(err, Error::MalformedPredicate { .. }));
    }

    #[test]
    fn test_empty_template_rejected() {
        let err = Fragment::new().where_("  ", ()).compile().unwrap_err();
        assert!(matches!(err, Error::InvalidQuery { .. }));
    }

    #[test]
    fn test_quoted_question_marks_are_not_placeholders() {
        assert_eq!(count_placeholders("title = 'why?' AND id = ?"), 1);
        assert_eq!(count_placeholders(r#""odd?col" = ?"#), 1);
        assert_eq!(count_placeholders("title = 'it''s?'"), 0);
    }

    #[test]
    fn test_clone_chain_leaves_base_fragment_untouched() {
        let base = Fragment::new().where_("a = ?", 1);
        let extended = base.clone().where_("b = ?", 2);
        assert_eq!(base.predicates().len(), 1);
        assert_eq!(extended.predicates().len(), 2);
    }
}
