use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, DbErr,
    EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, Set, Unchanged, Value,
};

use crate::entities::{
    content_blocks, courses, departments, events, faqs, gallery_items, prelude::*,
};
use crate::models::content::{
    ContentBlockPatch, CoursePatch, DepartmentPatch, EventPatch, FaqPatch, GalleryItemPatch,
    NewContentBlock, NewCourse, NewDepartment, NewEvent, NewFaq, NewGalleryItem,
};

/// Typed CRUD over the public site content tables.
///
/// Updates are single `UPDATE ... WHERE id = ?` statements; a missing row
/// comes back as `Ok(None)`.
pub struct ContentRepository {
    conn: DatabaseConnection,
}

fn patch<T: Into<Value>>(slot: &mut ActiveValue<T>, value: Option<T>) {
    if let Some(value) = value {
        *slot = Set(value);
    }
}

/// `Some(None)` clears the column.
fn patch_nullable<T: Into<Value>>(slot: &mut ActiveValue<Option<T>>, value: Option<Option<T>>)
where
    Option<T>: Into<Value>,
{
    if let Some(value) = value {
        *slot = Set(value);
    }
}

impl ContentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    async fn update_row<A>(
        &self,
        active: A,
        kind: &str,
    ) -> Result<Option<<A::Entity as EntityTrait>::Model>>
    where
        A: ActiveModelTrait + ActiveModelBehavior + Send + 'static,
        <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    {
        match active.update(&self.conn).await {
            Ok(model) => Ok(Some(model)),
            Err(DbErr::RecordNotUpdated) => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to update {kind}")),
        }
    }

    // ========== Content blocks ==========

    pub async fn list_content(&self) -> Result<Vec<content_blocks::Model>> {
        ContentBlocks::find()
            .order_by_asc(content_blocks::Column::Section)
            .order_by_asc(content_blocks::Column::Order)
            .all(&self.conn)
            .await
            .context("Failed to list content")
    }

    pub async fn list_content_by_section(
        &self,
        section: &str,
    ) -> Result<Vec<content_blocks::Model>> {
        ContentBlocks::find()
            .filter(content_blocks::Column::Section.eq(section))
            .order_by_asc(content_blocks::Column::Order)
            .all(&self.conn)
            .await
            .context("Failed to list content by section")
    }

    pub async fn create_content(&self, input: NewContentBlock) -> Result<content_blocks::Model> {
        let now = Utc::now();
        content_blocks::ActiveModel {
            section: Set(input.section),
            title: Set(input.title),
            subtitle: Set(input.subtitle),
            description: Set(input.description),
            image_url: Set(input.image_url),
            link_url: Set(input.link_url),
            link_text: Set(input.link_text),
            order: Set(input.order),
            is_active: Set(input.is_active),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert content")
    }

    pub async fn update_content(
        &self,
        id: i32,
        input: ContentBlockPatch,
    ) -> Result<Option<content_blocks::Model>> {
        let mut active = content_blocks::ActiveModel {
            id: Unchanged(id),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        patch(&mut active.section, input.section);
        patch_nullable(&mut active.title, input.title);
        patch_nullable(&mut active.subtitle, input.subtitle);
        patch_nullable(&mut active.description, input.description);
        patch_nullable(&mut active.image_url, input.image_url);
        patch_nullable(&mut active.link_url, input.link_url);
        patch_nullable(&mut active.link_text, input.link_text);
        patch(&mut active.order, input.order);
        patch(&mut active.is_active, input.is_active);

        self.update_row(active, "content").await
    }

    // ========== Courses ==========

    pub async fn list_courses(&self) -> Result<Vec<courses::Model>> {
        Courses::find()
            .order_by_asc(courses::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list courses")
    }

    pub async fn list_courses_by_category(&self, category: &str) -> Result<Vec<courses::Model>> {
        Courses::find()
            .filter(courses::Column::Category.eq(category))
            .order_by_asc(courses::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list courses by category")
    }

    pub async fn create_course(&self, input: NewCourse) -> Result<courses::Model> {
        let now = Utc::now();
        courses::ActiveModel {
            title: Set(input.title),
            category: Set(input.category),
            duration: Set(input.duration),
            description: Set(input.description),
            image_url: Set(input.image_url),
            is_featured: Set(input.is_featured),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert course")
    }

    pub async fn update_course(
        &self,
        id: i32,
        input: CoursePatch,
    ) -> Result<Option<courses::Model>> {
        let mut active = courses::ActiveModel {
            id: Unchanged(id),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        patch(&mut active.title, input.title);
        patch(&mut active.category, input.category);
        patch(&mut active.duration, input.duration);
        patch(&mut active.description, input.description);
        patch_nullable(&mut active.image_url, input.image_url);
        patch(&mut active.is_featured, input.is_featured);

        self.update_row(active, "course").await
    }

    // ========== Departments ==========

    pub async fn list_departments(&self) -> Result<Vec<departments::Model>> {
        Departments::find()
            .order_by_asc(departments::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to list departments")
    }

    pub async fn create_department(&self, input: NewDepartment) -> Result<departments::Model> {
        let now = Utc::now();
        departments::ActiveModel {
            name: Set(input.name),
            description: Set(input.description),
            image_url: Set(input.image_url),
            faculty_count: Set(input.faculty_count),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert department")
    }

    pub async fn update_department(
        &self,
        id: i32,
        input: DepartmentPatch,
    ) -> Result<Option<departments::Model>> {
        let mut active = departments::ActiveModel {
            id: Unchanged(id),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        patch(&mut active.name, input.name);
        patch(&mut active.description, input.description);
        patch_nullable(&mut active.image_url, input.image_url);
        patch(&mut active.faculty_count, input.faculty_count);

        self.update_row(active, "department").await
    }

    // ========== Gallery ==========

    pub async fn list_gallery(&self) -> Result<Vec<gallery_items::Model>> {
        GalleryItems::find()
            .order_by_desc(gallery_items::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list gallery items")
    }

    pub async fn list_gallery_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<gallery_items::Model>> {
        GalleryItems::find()
            .filter(gallery_items::Column::Category.eq(category))
            .order_by_desc(gallery_items::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list gallery items by category")
    }

    pub async fn create_gallery_item(&self, input: NewGalleryItem) -> Result<gallery_items::Model> {
        let now = Utc::now();
        gallery_items::ActiveModel {
            title: Set(input.title),
            artist: Set(input.artist),
            category: Set(input.category),
            image_url: Set(input.image_url),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert gallery item")
    }

    pub async fn update_gallery_item(
        &self,
        id: i32,
        input: GalleryItemPatch,
    ) -> Result<Option<gallery_items::Model>> {
        let mut active = gallery_items::ActiveModel {
            id: Unchanged(id),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        patch(&mut active.title, input.title);
        patch_nullable(&mut active.artist, input.artist);
        patch(&mut active.category, input.category);
        patch(&mut active.image_url, input.image_url);

        self.update_row(active, "gallery item").await
    }

    // ========== Events ==========

    pub async fn list_events(&self) -> Result<Vec<events::Model>> {
        Events::find()
            .order_by_asc(events::Column::Date)
            .all(&self.conn)
            .await
            .context("Failed to list events")
    }

    pub async fn list_events_by_category(&self, category: &str) -> Result<Vec<events::Model>> {
        Events::find()
            .filter(events::Column::Category.eq(category))
            .order_by_asc(events::Column::Date)
            .all(&self.conn)
            .await
            .context("Failed to list events by category")
    }

    /// Events starting now or later, soonest first.
    pub async fn list_upcoming_events(&self) -> Result<Vec<events::Model>> {
        Events::find()
            .filter(events::Column::Date.gte(Utc::now()))
            .order_by_asc(events::Column::Date)
            .all(&self.conn)
            .await
            .context("Failed to list upcoming events")
    }

    /// Events that started before now, most recent first.
    pub async fn list_past_events(&self) -> Result<Vec<events::Model>> {
        Events::find()
            .filter(events::Column::Date.lt(Utc::now()))
            .order_by_desc(events::Column::Date)
            .all(&self.conn)
            .await
            .context("Failed to list past events")
    }

    pub async fn create_event(&self, input: NewEvent) -> Result<events::Model> {
        let now = Utc::now();
        events::ActiveModel {
            title: Set(input.title),
            description: Set(input.description),
            date: Set(input.date),
            end_date: Set(input.end_date),
            location: Set(input.location),
            image_url: Set(input.image_url),
            category: Set(input.category),
            is_featured: Set(input.is_featured),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert event")
    }

    pub async fn update_event(&self, id: i32, input: EventPatch) -> Result<Option<events::Model>> {
        let mut active = events::ActiveModel {
            id: Unchanged(id),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        patch(&mut active.title, input.title);
        patch(&mut active.description, input.description);
        patch(&mut active.date, input.date);
        patch_nullable(&mut active.end_date, input.end_date);
        patch(&mut active.location, input.location);
        patch_nullable(&mut active.image_url, input.image_url);
        patch(&mut active.category, input.category);
        patch(&mut active.is_featured, input.is_featured);

        self.update_row(active, "event").await
    }

    // ========== FAQs ==========

    pub async fn list_faqs(&self) -> Result<Vec<faqs::Model>> {
        Faqs::find()
            .order_by_asc(faqs::Column::Category)
            .order_by_asc(faqs::Column::Order)
            .all(&self.conn)
            .await
            .context("Failed to list FAQs")
    }

    pub async fn list_faqs_by_category(&self, category: &str) -> Result<Vec<faqs::Model>> {
        Faqs::find()
            .filter(faqs::Column::Category.eq(category))
            .order_by_asc(faqs::Column::Order)
            .all(&self.conn)
            .await
            .context("Failed to list FAQs by category")
    }

    pub async fn create_faq(&self, input: NewFaq) -> Result<faqs::Model> {
        let now = Utc::now();
        faqs::ActiveModel {
            question: Set(input.question),
            answer: Set(input.answer),
            category: Set(input.category),
            order: Set(input.order),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert FAQ")
    }

    pub async fn update_faq(&self, id: i32, input: FaqPatch) -> Result<Option<faqs::Model>> {
        let mut active = faqs::ActiveModel {
            id: Unchanged(id),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        patch(&mut active.question, input.question);
        patch(&mut active.answer, input.answer);
        patch(&mut active.category, input.category);
        patch(&mut active.order, input.order);

        self.update_row(active, "FAQ").await
    }

    /// True when none of the content tables hold any rows.
    pub async fn is_empty(&self) -> Result<bool> {
        let total = ContentBlocks::find().count(&self.conn).await?
            + Courses::find().count(&self.conn).await?
            + Departments::find().count(&self.conn).await?
            + GalleryItems::find().count(&self.conn).await?
            + Events::find().count(&self.conn).await?
            + Faqs::find().count(&self.conn).await?;

        Ok(total == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;
    use chrono::Duration;

    async fn repo() -> ContentRepository {
        Store::new("sqlite::memory:").await.unwrap().content_repo()
    }

    fn course(title: &str, category: &str) -> NewCourse {
        NewCourse {
            title: title.to_string(),
            category: category.to_string(),
            duration: "4 years".to_string(),
            description: "Studio practice".to_string(),
            image_url: None,
            is_featured: false,
        }
    }

    fn event(title: &str, offset: Duration) -> NewEvent {
        NewEvent {
            title: title.to_string(),
            description: "Details".to_string(),
            date: Utc::now() + offset,
            end_date: None,
            location: "Auditorium".to_string(),
            image_url: None,
            category: "general".to_string(),
            is_featured: false,
        }
    }

    #[tokio::test]
    async fn test_update_patches_only_given_fields() {
        let repo = repo().await;
        let created = repo.create_course(course("Painting", "fine-arts")).await.unwrap();

        let updated = repo
            .update_course(
                created.id,
                CoursePatch {
                    is_featured: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert!(updated.is_featured);
        assert_eq!(updated.title, "Painting");
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_update_clears_nullable_fields() {
        let repo = repo().await;
        let mut input = course("Photography", "media");
        input.image_url = Some("/images/photo.jpg".to_string());
        let created = repo.create_course(input).await.unwrap();

        let kept = repo
            .update_course(
                created.id,
                CoursePatch {
                    title: Some("Photography II".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(kept.image_url.as_deref(), Some("/images/photo.jpg"));

        let cleared = repo
            .update_course(
                created.id,
                CoursePatch {
                    image_url: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cleared.image_url, None);
        assert_eq!(cleared.title, "Photography II");
    }

    #[tokio::test]
    async fn test_update_missing_row_returns_none() {
        let repo = repo().await;
        let result = repo.update_faq(42, FaqPatch::default()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_category_filter() {
        let repo = repo().await;
        assert!(repo.is_empty().await.unwrap());

        repo.create_course(course("Painting", "fine-arts")).await.unwrap();
        repo.create_course(course("Film", "media")).await.unwrap();

        let media = repo.list_courses_by_category("media").await.unwrap();
        assert_eq!(media.len(), 1);
        assert_eq!(media[0].title, "Film");
        assert_eq!(repo.list_courses().await.unwrap().len(), 2);
        assert!(!repo.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_upcoming_and_past_events() {
        let repo = repo().await;
        repo.create_event(event("Graduation", Duration::days(10))).await.unwrap();
        repo.create_event(event("Open Day", Duration::days(-3))).await.unwrap();

        let upcoming = repo.list_upcoming_events().await.unwrap();
        let past = repo.list_past_events().await.unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].title, "Graduation");
        assert_eq!(past.len(), 1);
        assert_eq!(past[0].title, "Open Day");
    }
}
