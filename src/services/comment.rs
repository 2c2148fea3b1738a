//! Comment service
//!
//! Creation, editing and deletion of comments. Every mutation of an existing
//! comment goes through [`CommentService::get_owned`], which hides comments
//! that belong to someone else behind the same `NotFound` as missing ones.

use std::sync::Arc;

use anyhow::Context;

use crate::db::repositories::CommentRepository;
use crate::models::{Comment, CommentForm, CommentWithAuthor, NewComment, User};
use crate::services::moderation::Moderator;

/// Error types for comment service operations
#[derive(Debug, thiserror::Error)]
pub enum CommentServiceError {
    /// Comment does not exist, or the caller is not its author
    #[error("Comment not found")]
    NotFound,

    /// The form did not pass validation; it carries the field errors
    #[error("Comment form is invalid")]
    Validation(CommentForm),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Comment service
pub struct CommentService {
    repo: Arc<dyn CommentRepository>,
    moderator: Moderator,
}

impl CommentService {
    pub fn new(repo: Arc<dyn CommentRepository>, moderator: Moderator) -> Self {
        Self { repo, moderator }
    }

    /// Comments under a news item, oldest first
    pub async fn list_for_news(
        &self,
        news_id: i64,
    ) -> Result<Vec<CommentWithAuthor>, CommentServiceError> {
        Ok(self
            .repo
            .list_for_news(news_id)
            .await
            .context("Failed to list comments")?)
    }

    /// Validate `form` and store it as a new comment by `author`
    pub async fn create(
        &self,
        news_id: i64,
        author: &User,
        form: CommentForm,
    ) -> Result<Comment, CommentServiceError> {
        let form = self.validate(form)?;

        let comment = self
            .repo
            .create(&NewComment::now(news_id, author.id, form.text))
            .await
            .context("Failed to create comment")?;

        tracing::info!(
            "Comment {} added to news {} by {}",
            comment.id,
            news_id,
            author.username
        );
        Ok(comment)
    }

    /// Load a comment for modification by `user`.
    ///
    /// Missing comments and comments written by another user both yield
    /// `NotFound`.
    pub async fn get_owned(&self, id: i64, user: &User) -> Result<Comment, CommentServiceError> {
        let comment = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get comment")?
            .ok_or(CommentServiceError::NotFound)?;

        if !user.owns(comment.author_id) {
            tracing::debug!(
                "User {} tried to modify comment {} owned by user {}",
                user.id,
                comment.id,
                comment.author_id
            );
            return Err(CommentServiceError::NotFound);
        }

        Ok(comment)
    }

    /// Replace the text of an owned comment
    pub async fn update(
        &self,
        comment: Comment,
        form: CommentForm,
    ) -> Result<Comment, CommentServiceError> {
        let form = self.validate(form)?;

        let updated = self
            .repo
            .update_text(comment.id, &form.text)
            .await
            .context("Failed to update comment")?;
        if !updated {
            return Err(CommentServiceError::NotFound);
        }

        tracing::info!("Comment {} edited", comment.id);
        Ok(Comment {
            text: form.text,
            ..comment
        })
    }

    /// Delete an owned comment
    pub async fn delete(&self, comment: &Comment) -> Result<(), CommentServiceError> {
        let deleted = self
            .repo
            .delete(comment.id)
            .await
            .context("Failed to delete comment")?;
        if !deleted {
            return Err(CommentServiceError::NotFound);
        }

        tracing::info!("Comment {} deleted", comment.id);
        Ok(())
    }

    pub async fn count(&self) -> Result<i64, CommentServiceError> {
        Ok(self.repo.count().await.context("Failed to count comments")?)
    }

    fn validate(&self, mut form: CommentForm) -> Result<CommentForm, CommentServiceError> {
        if self.moderator.clean(&mut form) {
            Ok(form)
        } else {
            Err(CommentServiceError::Validation(form))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NewsConfig;
    use crate::db::repositories::{
        NewsRepository, SqlxCommentRepository, SqlxNewsRepository, SqlxUserRepository,
        UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::CreateNewsInput;

    struct Fixture {
        service: CommentService,
        news_id: i64,
        author: User,
        reader: User,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let author = users.create(&User::new("Лев Толстой", "hash")).await.unwrap();
        let reader = users
            .create(&User::new("Читатель простой", "hash"))
            .await
            .unwrap();
        let news_id = SqlxNewsRepository::new(pool.clone())
            .create(&CreateNewsInput::new("Заголовок", "Текст"))
            .await
            .unwrap()
            .id;

        Fixture {
            service: CommentService::new(
                SqlxCommentRepository::boxed(pool),
                Moderator::from_config(&NewsConfig::default()),
            ),
            news_id,
            author,
            reader,
        }
    }

    #[tokio::test]
    async fn test_create_comment() {
        let f = setup().await;

        let comment = f
            .service
            .create(f.news_id, &f.author, CommentForm::bound("Текст комментария"))
            .await
            .expect("Failed to create comment");

        assert_eq!(comment.text, "Текст комментария");
        assert_eq!(comment.author_id, f.author.id);
        assert_eq!(comment.news_id, f.news_id);
        assert_eq!(f.service.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_words() {
        let f = setup().await;

        let result = f
            .service
            .create(
                f.news_id,
                &f.author,
                CommentForm::bound("Какой-то текст, редиска, еще текст"),
            )
            .await;

        match result {
            Err(CommentServiceError::Validation(form)) => {
                assert_eq!(form.errors.field("text"), ["Не ругайтесь!"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(f.service.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_get_owned_hides_foreign_comments() {
        let f = setup().await;
        let comment = f
            .service
            .create(f.news_id, &f.author, CommentForm::bound("Текст комментария"))
            .await
            .unwrap();

        let own = f.service.get_owned(comment.id, &f.author).await;
        let foreign = f.service.get_owned(comment.id, &f.reader).await;
        let missing = f.service.get_owned(comment.id + 100, &f.author).await;

        assert_eq!(own.unwrap().id, comment.id);
        assert!(matches!(foreign, Err(CommentServiceError::NotFound)));
        assert!(matches!(missing, Err(CommentServiceError::NotFound)));
    }

    #[tokio::test]
    async fn test_update_comment() {
        let f = setup().await;
        let comment = f
            .service
            .create(f.news_id, &f.author, CommentForm::bound("Текст комментария"))
            .await
            .unwrap();

        let updated = f
            .service
            .update(comment.clone(), CommentForm::bound("Обновлённый комментарий"))
            .await
            .unwrap();

        assert_eq!(updated.text, "Обновлённый комментарий");
        assert_eq!(updated.created, comment.created);
        let listed = f.service.list_for_news(f.news_id).await.unwrap();
        assert_eq!(listed[0].comment.text, "Обновлённый комментарий");
    }

    #[tokio::test]
    async fn test_update_with_bad_word_keeps_text() {
        let f = setup().await;
        let comment = f
            .service
            .create(f.news_id, &f.author, CommentForm::bound("Текст комментария"))
            .await
            .unwrap();

        let result = f
            .service
            .update(comment, CommentForm::bound("ты НЕГОДЯЙ"))
            .await;

        assert!(matches!(result, Err(CommentServiceError::Validation(_))));
        let listed = f.service.list_for_news(f.news_id).await.unwrap();
        assert_eq!(listed[0].comment.text, "Текст комментария");
    }

    #[tokio::test]
    async fn test_delete_comment() {
        let f = setup().await;
        let comment = f
            .service
            .create(f.news_id, &f.author, CommentForm::bound("Текст комментария"))
            .await
            .unwrap();

        f.service.delete(&comment).await.unwrap();

        assert_eq!(f.service.count().await.unwrap(), 0);
        assert!(matches!(
            f.service.delete(&comment).await,
            Err(CommentServiceError::NotFound)
        ));
    }
}
