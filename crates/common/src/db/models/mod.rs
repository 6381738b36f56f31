//! SeaORM entity models

mod user;
mod article;
mod comment;
mod article_like;
mod favorite;
mod follow;
mod message;
mod conversation;

pub use user::{
    Entity as UserEntity,
    Model as User,
    ActiveModel as UserActiveModel,
    Column as UserColumn,
    Role,
};

pub use article::{
    Entity as ArticleEntity,
    Model as Article,
    ActiveModel as ArticleActiveModel,
    Column as ArticleColumn,
};

pub use comment::{
    Entity as CommentEntity,
    Model as Comment,
    ActiveModel as CommentActiveModel,
    Column as CommentColumn,
};

pub use article_like::{
    Entity as ArticleLikeEntity,
    Model as ArticleLike,
    ActiveModel as ArticleLikeActiveModel,
    Column as ArticleLikeColumn,
};

pub use favorite::{
    Entity as FavoriteEntity,
    Model as Favorite,
    ActiveModel as FavoriteActiveModel,
    Column as FavoriteColumn,
};

pub use follow::{
    Entity as FollowEntity,
    Model as Follow,
    ActiveModel as FollowActiveModel,
    Column as FollowColumn,
};

pub use message::{
    Entity as MessageEntity,
    Model as Message,
    ActiveModel as MessageActiveModel,
    Column as MessageColumn,
};

pub use conversation::{
    Entity as ConversationEntity,
    Model as Conversation,
    ActiveModel as ConversationActiveModel,
    Column as ConversationColumn,
};
