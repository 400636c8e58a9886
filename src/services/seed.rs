//! Demo content for a fresh database.

use anyhow::Result;
use chrono::{Duration, Utc};
use tracing::info;

use crate::db::Store;
use crate::models::content::{
    NewContentBlock, NewCourse, NewDepartment, NewEvent, NewFaq, NewGalleryItem,
};

fn block(section: &str, order: i32, title: &str, subtitle: &str, description: &str) -> NewContentBlock {
    NewContentBlock {
        section: section.to_string(),
        title: Some(title.to_string()),
        subtitle: Some(subtitle.to_string()),
        description: Some(description.to_string()),
        image_url: None,
        link_url: None,
        link_text: None,
        order,
        is_active: true,
    }
}

fn course(title: &str, category: &str, duration: &str, description: &str, featured: bool) -> NewCourse {
    NewCourse {
        title: title.to_string(),
        category: category.to_string(),
        duration: duration.to_string(),
        description: description.to_string(),
        image_url: None,
        is_featured: featured,
    }
}

fn faq(category: &str, order: i32, question: &str, answer: &str) -> NewFaq {
    NewFaq {
        question: question.to_string(),
        answer: answer.to_string(),
        category: category.to_string(),
        order,
    }
}

/// Populates the content tables when all of them are empty. Returns whether
/// anything was written.
pub async fn seed_demo_content(store: &Store) -> Result<bool> {
    let repo = store.content_repo();
    if !repo.is_empty().await? {
        info!("Database already has content, skipping seed");
        return Ok(false);
    }

    info!("Seeding database with demo content");

    let mut welcome = block(
        "home",
        1,
        "Welcome to the College",
        "Excellence in Art and Design Education",
        "Programs that combine traditional technique with current tools.",
    );
    welcome.link_url = Some("/about".to_string());
    welcome.link_text = Some("Learn More".to_string());

    for input in [
        welcome,
        block(
            "home",
            2,
            "Upcoming Admissions",
            "Applications are open",
            "Early applications receive priority for scholarships and financial aid.",
        ),
        block(
            "about",
            1,
            "Our History",
            "A legacy of creative work",
            "From a small design school to a full art and design institution.",
        ),
        block(
            "about",
            2,
            "Our Mission",
            "Inspiring creative leaders",
            "We nurture creative talent in an inclusive environment.",
        ),
    ] {
        repo.create_content(input).await?;
    }

    for input in [
        course(
            "Bachelor of Fine Arts",
            "undergraduate",
            "4 years",
            "Painting, sculpture and mixed media with traditional and contemporary technique.",
            true,
        ),
        course(
            "Bachelor of Animation",
            "undergraduate",
            "4 years",
            "2D and 3D animation, storyboarding, character design and motion graphics.",
            true,
        ),
        course(
            "Master of Design",
            "postgraduate",
            "2 years",
            "Visual communication, product design and digital interfaces.",
            true,
        ),
        course(
            "Certificate in Digital Art",
            "certificate",
            "6 months",
            "Digital painting, 3D modelling and animation basics.",
            false,
        ),
    ] {
        repo.create_course(input).await?;
    }

    for (name, description, faculty_count) in [
        ("Fine Arts", "Painting, drawing, sculpture and printmaking.", 12),
        ("Design", "Graphic, product and interaction design.", 9),
        ("Media Arts", "Animation, film and photography.", 8),
    ] {
        repo.create_department(NewDepartment {
            name: name.to_string(),
            description: description.to_string(),
            image_url: None,
            faculty_count,
        })
        .await?;
    }

    for (title, artist, category) in [
        ("Morning Light", Some("Student Exhibition"), "painting"),
        ("Form Study", None, "sculpture"),
        ("City Lines", Some("Photography Club"), "photography"),
    ] {
        repo.create_gallery_item(NewGalleryItem {
            title: title.to_string(),
            artist: artist.map(ToString::to_string),
            category: category.to_string(),
            image_url: format!("/images/gallery/{}.jpg", title.to_lowercase().replace(' ', "-")),
        })
        .await?;
    }

    let now = Utc::now();
    for (title, offset_days, location, category) in [
        ("Annual Student Exhibition", 21, "Main Gallery", "exhibition"),
        ("Portfolio Review Day", 45, "Design Studio", "admissions"),
        ("Alumni Talk", -14, "Auditorium", "talk"),
    ] {
        let date = now + Duration::days(offset_days);
        repo.create_event(NewEvent {
            title: title.to_string(),
            description: format!("{title} at the {location}."),
            date,
            end_date: Some(date + Duration::hours(3)),
            location: location.to_string(),
            image_url: None,
            category: category.to_string(),
            is_featured: offset_days > 0,
        })
        .await?;
    }

    for input in [
        faq(
            "admissions",
            1,
            "When do applications open?",
            "Applications for the autumn intake open in March.",
        ),
        faq(
            "admissions",
            2,
            "Do I need a portfolio?",
            "Yes, undergraduate and postgraduate programs require a portfolio.",
        ),
        faq(
            "general",
            1,
            "Can I visit the campus?",
            "Campus tours run every Saturday during term.",
        ),
    ] {
        repo.create_faq(input).await?;
    }

    info!("Demo content seeded");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let store = Store::new("sqlite::memory:").await.unwrap();

        assert!(seed_demo_content(&store).await.unwrap());
        let courses = store.content_repo().list_courses().await.unwrap().len();

        assert!(!seed_demo_content(&store).await.unwrap());
        assert_eq!(store.content_repo().list_courses().await.unwrap().len(), courses);
        assert_eq!(store.content_repo().list_past_events().await.unwrap().len(), 1);
    }
}
