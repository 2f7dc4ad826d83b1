//! Questionnaire template registry.

use crate::db::Database;
use crate::models::Template;

use super::{ExamError, ExamResult, ValidationError};

pub struct TemplateRegistry<'a> {
    db: &'a Database,
}

impl<'a> TemplateRegistry<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn create(&self, mut template: Template) -> ExamResult<Template> {
        validate(&template)?;
        template.id = self.db.insert_template(&template)?;
        tracing::info!(template_id = template.id, "created template");
        Ok(template)
    }

    pub fn update(&self, template: Template) -> ExamResult<Template> {
        validate(&template)?;
        if !self.db.update_template(&template)? {
            return Err(ExamError::not_found("template", template.id));
        }
        tracing::info!(template_id = template.id, "updated template");
        Ok(template)
    }

    pub fn delete(&self, template_id: i64) -> ExamResult<i64> {
        if !self.db.delete_template(template_id)? {
            return Err(ExamError::not_found("template", template_id));
        }
        tracing::info!(template_id, "deleted template");
        Ok(template_id)
    }

    pub fn get(&self, template_id: i64) -> ExamResult<Template> {
        self.db
            .get_template(template_id)?
            .ok_or_else(|| ExamError::not_found("template", template_id))
    }

    /// Newest first.
    pub fn list(&self) -> ExamResult<Vec<Template>> {
        Ok(self.db.list_templates()?)
    }
}

fn validate(template: &Template) -> Result<(), ValidationError> {
    if template.name.trim().is_empty() {
        return Err(ValidationError::BlankField("name"));
    }
    if template.fields.iter().any(|field| field.title.trim().is_empty()) {
        return Err(ValidationError::BlankField("field title"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldKind, TemplateField};

    #[test]
    fn test_template_crud() {
        let db = Database::open_in_memory().unwrap();
        let registry = TemplateRegistry::new(&db);

        let mut template = Template::new("Urinary symptoms");
        template.fields.push(TemplateField {
            title: "Dysuria".into(),
            kind: FieldKind::SingleChoice,
            options: "Yes,No".into(),
        });
        let mut created = registry.create(template).unwrap();

        created.description = Some("Asked at collection".into());
        registry.update(created.clone()).unwrap();
        assert_eq!(registry.get(created.id).unwrap(), created);

        assert_eq!(registry.delete(created.id).unwrap(), created.id);
        assert!(registry.list().unwrap().is_empty());
    }

    #[test]
    fn test_blank_names_rejected() {
        let db = Database::open_in_memory().unwrap();
        let registry = TemplateRegistry::new(&db);

        assert!(matches!(
            registry.create(Template::new(" ")),
            Err(ExamError::Validation(ValidationError::BlankField("name")))
        ));

        let mut template = Template::new("Intake");
        template.fields.push(TemplateField::default());
        assert!(matches!(
            registry.create(template),
            Err(ExamError::Validation(ValidationError::BlankField("field title")))
        ));
    }

    #[test]
    fn test_missing_template() {
        let db = Database::open_in_memory().unwrap();
        let registry = TemplateRegistry::new(&db);

        let mut template = Template::new("Ghost");
        template.id = 5;
        assert!(matches!(
            registry.update(template),
            Err(ExamError::NotFound { entity: "template", id: 5 })
        ));
        assert!(matches!(registry.delete(5), Err(ExamError::NotFound { .. })));
        assert!(matches!(registry.get(5), Err(ExamError::NotFound { .. })));
    }
}
