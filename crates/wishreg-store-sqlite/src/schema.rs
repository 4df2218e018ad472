//! SQL schema for the wishreg SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,    -- argon2 PHC string
    full_name     TEXT,
    avatar_url    TEXT,
    birthday      TEXT,             -- YYYY-MM-DD
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    token       TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    created_at  TEXT NOT NULL
);

-- Exactly one per user; written by upsert.
CREATE TABLE IF NOT EXISTS profiles (
    profile_id  TEXT PRIMARY KEY REFERENCES users(user_id) ON DELETE CASCADE,
    full_name   TEXT NOT NULL,
    username    TEXT NOT NULL,
    avatar_url  TEXT,
    birthday    TEXT,
    group_code  TEXT
);

CREATE TABLE IF NOT EXISTS follows (
    follower_id   TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    following_id  TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    created_at    TEXT NOT NULL,
    PRIMARY KEY (follower_id, following_id)
);

CREATE TABLE IF NOT EXISTS user_groups (
    group_id    TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    code        TEXT NOT NULL UNIQUE COLLATE NOCASE,
    creator_id  TEXT NOT NULL REFERENCES users(user_id),
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS group_members (
    group_id   TEXT NOT NULL REFERENCES user_groups(group_id) ON DELETE CASCADE,
    user_id    TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    joined_at  TEXT NOT NULL,
    PRIMARY KEY (group_id, user_id)
);

CREATE TABLE IF NOT EXISTS gifts (
    gift_id      TEXT PRIMARY KEY,
    owner_id     TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    name         TEXT NOT NULL,
    price        TEXT NOT NULL DEFAULT '',   -- digits only
    currency     TEXT NOT NULL DEFAULT 'NGN',
    description  TEXT NOT NULL DEFAULT '',
    image_url    TEXT,
    reserved_by  TEXT REFERENCES users(user_id) ON DELETE SET NULL,
    created_at   TEXT NOT NULL
);

-- owner_id never changes once a gift exists.
CREATE TRIGGER IF NOT EXISTS gifts_owner_immutable
BEFORE UPDATE OF owner_id ON gifts
WHEN NEW.owner_id IS NOT OLD.owner_id
BEGIN
    SELECT RAISE(ABORT, 'gift owner is immutable');
END;

CREATE INDEX IF NOT EXISTS gifts_owner_idx        ON gifts(owner_id);
CREATE INDEX IF NOT EXISTS follows_following_idx  ON follows(following_id);
CREATE INDEX IF NOT EXISTS group_members_user_idx ON group_members(user_id);
CREATE INDEX IF NOT EXISTS sessions_user_idx      ON sessions(user_id);

PRAGMA user_version = 1;
";
