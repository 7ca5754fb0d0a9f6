//! End-to-end editing workflows against in-memory stores.

use std::sync::Arc;

use newsdesk::{
    App, Article, Category, Chapter, Config, DocumentId, Form, Image, News, Route, Status,
    domain::ImageFile,
    storage::{MemoryBlobStore, MemoryStore},
    validation::Rule,
};

struct Harness {
    store: Arc<MemoryStore>,
    blobs: Arc<MemoryBlobStore>,
    app: App,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let blobs = Arc::new(MemoryBlobStore::new("https://cdn.example"));
    let app = App::with_stores(Config::default(), store.clone(), blobs.clone());
    Harness { store, blobs, app }
}

fn png(preview: &str) -> Image {
    Image::picked(
        format!("data:image/png;base64,{preview}"),
        ImageFile {
            content_type: "image/png".to_string(),
            bytes: preview.as_bytes().to_vec(),
        },
    )
}

fn article_draft(category: &DocumentId) -> Article {
    Article {
        title: "The history of the harbour".to_string(),
        excerpt: "Four centuries of ships, storms and trade".to_string(),
        category: Some(category.clone()),
        text: "<p>It all started with a fishing village.</p>".to_string(),
        image: png("cover"),
        ..Article::default()
    }
}

#[tokio::test]
async fn first_news_item_in_a_new_category() {
    let h = harness();

    let mut category = Form::new(Category::default());
    category.edit(|c| c.name = "Sports".to_string());
    let sports = h
        .app
        .categories()
        .create(&category.submit().unwrap())
        .await
        .unwrap();

    let excerpt = "A thrilling final in the rain.";
    assert_eq!(excerpt.chars().count(), 30);

    let mut form = Form::new(News::default());
    form.edit(|n| {
        n.title = "Local team wins championship".to_string();
        n.excerpt = excerpt.to_string();
        n.category = sports.id.clone();
        n.text = "<p>After ninety minutes of rain the cup came home.</p>".to_string();
    });
    let created = h.app.news().create(&form.submit().unwrap()).await.unwrap();

    let state = h.app.news().state();
    assert_eq!(state.items.len(), 1);
    assert_eq!(state.items[0].title, "Local team wins championship");
    assert_eq!(state.items[0].status, Status::Concept);
    assert_eq!(state.selected_id, created.id);
    assert!(h.app.notifications().pending().is_empty());
}

#[tokio::test]
async fn blank_chapter_blocks_submission() {
    let h = harness();
    let category = DocumentId::new("history").unwrap();

    let mut form = Form::new(article_draft(&category));
    form.edit(|a| {
        a.chapters.insert(Chapter::new("Intro", ""));
    });

    let report = form.submit().unwrap_err();
    for path in ["chapters[0].text", "chapters[0].image.imageUrl"] {
        let error = report.error(path).unwrap();
        assert_eq!(error.rule, Rule::Custom("at-least-one"));
        assert_eq!(error.message, "A chapter must have either text or an image.");
    }
    assert!(form.visible_error("chapters[0].text").is_some());
    assert_eq!(h.store.write_count(), 0);
    assert!(h.blobs.paths().await.is_empty());
}

#[tokio::test]
async fn article_lifecycle() {
    let h = harness();
    let history = h
        .app
        .categories()
        .create(&Category::new("History"))
        .await
        .unwrap()
        .id
        .unwrap();

    // Create with two chapters.
    let mut form = Form::new(article_draft(&history));
    form.edit(|a| {
        a.chapters
            .insert(Chapter::new("The village", "<p>Nets and boats.</p>"));
        a.chapters.insert(Chapter {
            image: png("quay"),
            image_caption: "The old quay".to_string(),
            ..Chapter::new("The quay", "")
        });
    });
    let created = h
        .app
        .articles()
        .create(&form.submit().unwrap())
        .await
        .unwrap();
    let id = created.id.clone().unwrap();

    assert_eq!(created.chapters.entries().len(), 2);
    assert_eq!(h.blobs.paths().await.len(), 2);
    assert!(h.blobs.contains(&created.image.url).await);

    // Publish, rename the first chapter and drop the second.
    form.set(created);
    form.edit(|a| {
        a.status = Status::Current;
        let first = a.chapters.get(1).cloned().unwrap();
        a.chapters
            .update(Chapter {
                title: "The fishing village".to_string(),
                ..first
            })
            .unwrap();
        a.chapters.remove(2).unwrap();
    });
    h.app
        .articles()
        .update(&form.submit().unwrap())
        .await
        .unwrap();

    let current = h.app.articles().state().current.unwrap();
    let titles: Vec<_> = current
        .chapters
        .entries()
        .iter()
        .map(|e| e.chapter.title.as_str())
        .collect();
    assert_eq!(titles, vec!["The fishing village"]);
    assert_eq!(h.blobs.paths().await.len(), 1);

    // The public overview now shows it.
    h.app.load().await.unwrap();
    let overview = h.app.article_overview();
    assert_eq!(overview.latest.map(|a| a.id), Some(id.clone()));
    assert_eq!(Route::parse("/articles"), Route::Articles);

    // The category is in use until the article is gone.
    assert!(!h.app.categories().can_delete(&history).await.unwrap());
    h.app.articles().delete(&id).await.unwrap();
    assert!(h.app.categories().can_delete(&history).await.unwrap());

    assert_eq!(h.store.count("articles").await, 0);
    assert_eq!(h.store.count("chapters").await, 0);
    assert!(h.blobs.paths().await.is_empty());
    assert_eq!(h.app.articles().state().current, None);
}

#[tokio::test]
async fn unavailable_store_notifies_and_keeps_the_list() {
    let h = harness();
    h.app
        .categories()
        .create(&Category::new("Economy"))
        .await
        .unwrap();

    h.store.set_unavailable("categories", true).await;
    assert!(h.app.categories().create(&Category::new("Culture")).await.is_err());

    let names: Vec<_> = h
        .app
        .categories()
        .state()
        .items
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Economy"]);

    let notifications = h.app.notifications().drain();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].title, "Creation error");
    assert_eq!(
        notifications[0].message,
        "An unexpected error occurred during creation of the category. Please try again later."
    );
}
