use crate::domain::value_objects::Category;

// ─────────────────────────────────────────────────────────────────────────────
// Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Catalog SQL for one database engine.
///
/// Every query aliases its columns to the record field names the comparator
/// keys on (`column_name`, `index_name`, `constraint_name`, `trigger_name`,
/// `procedure_name`, …), so records from different engines line up. Per-table
/// queries take the schema then the table as bind parameters, unless
/// [`CatalogDialect::binds_schema`] is `false`, in which case only the table
/// is bound.
pub trait CatalogDialect: Send + Sync {
    /// Return the driver name as a lowercase string ("postgres", "mysql", …).
    fn name(&self) -> &'static str;

    /// One row: name, collation_name, compatibility_level, …
    fn database_info_sql(&self) -> &'static str;

    /// One row per base table: schema_name, table_name.
    fn tables_sql(&self) -> &'static str;

    /// Query for one per-table category. `None` when the engine has no such
    /// object, which reads as an empty collection.
    fn objects_sql(&self, category: Category) -> Option<&'static str>;

    /// `None` when the engine has no stored procedures.
    fn procedures_sql(&self) -> Option<&'static str>;

    /// `false` for engines without schema namespaces (SQLite).
    fn binds_schema(&self) -> bool {
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PostgreSQL
// ─────────────────────────────────────────────────────────────────────────────

pub struct PostgresDialect;

impl CatalogDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn database_info_sql(&self) -> &'static str {
        "SELECT d.datname::TEXT AS name, \
                d.datcollate::TEXT AS collation_name, \
                current_setting('server_version_num')::TEXT AS compatibility_level, \
                CASE WHEN d.datallowconn THEN 'MULTI_USER' ELSE 'NO_CONNECT' END::TEXT AS user_access_desc, \
                CASE WHEN d.datistemplate THEN 'TEMPLATE' ELSE 'ONLINE' END::TEXT AS state_desc, \
                current_setting('wal_level')::TEXT AS recovery_model_desc, \
                CASE WHEN current_setting('data_checksums') = 'on' THEN 'CHECKSUM' ELSE 'NONE' END::TEXT AS page_verify_option_desc, \
                pg_encoding_to_char(d.encoding)::TEXT AS encoding \
         FROM pg_database d \
         WHERE d.datname = current_database()"
    }

    fn tables_sql(&self) -> &'static str {
        "SELECT table_schema::TEXT AS schema_name, table_name::TEXT AS table_name \
         FROM information_schema.tables \
         WHERE table_type = 'BASE TABLE' \
           AND table_schema NOT IN ('pg_catalog', 'information_schema') \
         ORDER BY table_schema, table_name"
    }

    fn objects_sql(&self, category: Category) -> Option<&'static str> {
        let sql = match category {
            Category::Fields => {
                "SELECT c.column_name::TEXT AS column_name, \
                        c.data_type::TEXT AS data_type, \
                        c.character_maximum_length::INT AS max_length, \
                        c.numeric_precision::INT AS \"precision\", \
                        c.numeric_scale::INT AS scale, \
                        (c.is_nullable = 'YES') AS is_nullable, \
                        c.ordinal_position::INT AS column_id, \
                        c.column_default::TEXT AS default_value, \
                        (c.is_identity = 'YES') AS is_identity, \
                        c.identity_start::TEXT AS seed_value, \
                        c.identity_increment::TEXT AS increment_value \
                 FROM information_schema.columns c \
                 WHERE c.table_schema = $1 AND c.table_name = $2 \
                 ORDER BY c.ordinal_position"
            }
            Category::PrimaryKeys => {
                "SELECT kcu.column_name::TEXT AS column_name, \
                        tc.constraint_name::TEXT AS index_name \
                 FROM information_schema.table_constraints tc \
                 JOIN information_schema.key_column_usage kcu \
                   ON kcu.constraint_schema = tc.constraint_schema \
                  AND kcu.constraint_name = tc.constraint_name \
                  AND kcu.table_name = tc.table_name \
                 WHERE tc.constraint_type = 'PRIMARY KEY' \
                   AND tc.table_schema = $1 AND tc.table_name = $2 \
                 ORDER BY kcu.ordinal_position"
            }
            Category::ForeignKeys => {
                "SELECT tc.constraint_name::TEXT AS constraint_name, \
                        tc.table_name::TEXT AS table_name, \
                        kcu.column_name::TEXT AS column_name, \
                        ccu.table_name::TEXT AS referenced_table_name, \
                        ccu.column_name::TEXT AS referenced_column_name, \
                        rc.update_rule::TEXT AS update_referential_action_desc, \
                        rc.delete_rule::TEXT AS delete_referential_action_desc \
                 FROM information_schema.table_constraints tc \
                 JOIN information_schema.key_column_usage kcu \
                   ON kcu.constraint_schema = tc.constraint_schema \
                  AND kcu.constraint_name = tc.constraint_name \
                 JOIN information_schema.referential_constraints rc \
                   ON rc.constraint_schema = tc.constraint_schema \
                  AND rc.constraint_name = tc.constraint_name \
                 JOIN information_schema.constraint_column_usage ccu \
                   ON ccu.constraint_schema = rc.unique_constraint_schema \
                  AND ccu.constraint_name = rc.unique_constraint_name \
                 WHERE tc.constraint_type = 'FOREIGN KEY' \
                   AND tc.table_schema = $1 AND tc.table_name = $2 \
                 ORDER BY tc.constraint_name"
            }
            Category::Indexes => {
                "SELECT i.relname::TEXT AS index_name, \
                        am.amname::TEXT AS type_desc, \
                        ix.indisunique AS is_unique, \
                        ix.indisprimary AS is_primary_key, \
                        EXISTS (SELECT 1 FROM pg_constraint pc \
                                WHERE pc.conindid = ix.indexrelid AND pc.contype = 'u') AS is_unique_constraint, \
                        string_agg(a.attname::TEXT, ', ' ORDER BY k.ord) AS column_names \
                 FROM pg_index ix \
                 JOIN pg_class t ON t.oid = ix.indrelid \
                 JOIN pg_namespace n ON n.oid = t.relnamespace \
                 JOIN pg_class i ON i.oid = ix.indexrelid \
                 JOIN pg_am am ON am.oid = i.relam \
                 CROSS JOIN LATERAL unnest(ix.indkey) WITH ORDINALITY AS k(attnum, ord) \
                 JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum \
                 WHERE n.nspname = $1 AND t.relname = $2 \
                 GROUP BY i.relname, am.amname, ix.indisunique, ix.indisprimary, ix.indexrelid \
                 ORDER BY i.relname"
            }
            Category::Constraints => {
                "SELECT c.conname::TEXT AS constraint_name, \
                        'CHECK_CONSTRAINT'::TEXT AS type_desc, \
                        c.convalidated AS is_enabled, \
                        t.relname::TEXT AS table_name, \
                        pg_get_constraintdef(c.oid) AS definition \
                 FROM pg_constraint c \
                 JOIN pg_class t ON t.oid = c.conrelid \
                 JOIN pg_namespace n ON n.oid = t.relnamespace \
                 WHERE c.contype = 'c' AND n.nspname = $1 AND t.relname = $2 \
                 ORDER BY c.conname"
            }
            Category::Triggers => {
                "SELECT tg.tgname::TEXT AS trigger_name, \
                        ((tg.tgtype::INT & 64) <> 0) AS is_instead_of_trigger, \
                        (tg.tgenabled = 'D') AS is_disabled, \
                        pg_get_triggerdef(tg.oid) AS trigger_definition \
                 FROM pg_trigger tg \
                 JOIN pg_class t ON t.oid = tg.tgrelid \
                 JOIN pg_namespace n ON n.oid = t.relnamespace \
                 WHERE NOT tg.tgisinternal AND n.nspname = $1 AND t.relname = $2 \
                 ORDER BY tg.tgname"
            }
            _ => return None,
        };
        Some(sql)
    }

    fn procedures_sql(&self) -> Option<&'static str> {
        Some(
            "SELECT p.proname::TEXT AS procedure_name, \
                    n.nspname::TEXT AS schema_name, \
                    CASE p.prokind WHEN 'p' THEN 'SQL_STORED_PROCEDURE' \
                                   ELSE 'SQL_SCALAR_FUNCTION' END::TEXT AS type_desc, \
                    pg_get_functiondef(p.oid) AS procedure_definition \
             FROM pg_proc p \
             JOIN pg_namespace n ON n.oid = p.pronamespace \
             WHERE n.nspname NOT IN ('pg_catalog', 'information_schema') \
               AND p.prokind IN ('p', 'f') \
             ORDER BY p.proname",
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MySQL / MariaDB
// ─────────────────────────────────────────────────────────────────────────────

// Unsigned information_schema counters are cast to SIGNED; the any driver
// does not decode unsigned 64-bit integers. Dates are cast to CHAR.

const MYSQL_DATABASE_INFO: &str = "SELECT SCHEMA_NAME AS name, \
            DEFAULT_COLLATION_NAME AS collation_name, \
            VERSION() AS compatibility_level, \
            DEFAULT_CHARACTER_SET_NAME AS encoding \
     FROM information_schema.SCHEMATA \
     WHERE SCHEMA_NAME = DATABASE()";

const MYSQL_TABLES: &str = "SELECT TABLE_SCHEMA AS schema_name, TABLE_NAME AS table_name \
     FROM information_schema.TABLES \
     WHERE TABLE_TYPE = 'BASE TABLE' AND TABLE_SCHEMA = DATABASE() \
     ORDER BY TABLE_NAME";

const MYSQL_COLUMNS: &str = "SELECT COLUMN_NAME AS column_name, \
            DATA_TYPE AS data_type, \
            CAST(CHARACTER_MAXIMUM_LENGTH AS SIGNED) AS max_length, \
            CAST(NUMERIC_PRECISION AS SIGNED) AS `precision`, \
            CAST(NUMERIC_SCALE AS SIGNED) AS scale, \
            IS_NULLABLE = 'YES' AS is_nullable, \
            CAST(ORDINAL_POSITION AS SIGNED) AS column_id, \
            COLUMN_DEFAULT AS default_value, \
            EXTRA LIKE '%auto_increment%' AS is_identity \
     FROM information_schema.COLUMNS \
     WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? \
     ORDER BY ORDINAL_POSITION";

const MYSQL_PRIMARY_KEYS: &str = "SELECT COLUMN_NAME AS column_name, CONSTRAINT_NAME AS index_name \
     FROM information_schema.KEY_COLUMN_USAGE \
     WHERE CONSTRAINT_NAME = 'PRIMARY' AND TABLE_SCHEMA = ? AND TABLE_NAME = ? \
     ORDER BY ORDINAL_POSITION";

const MYSQL_FOREIGN_KEYS: &str = "SELECT k.CONSTRAINT_NAME AS constraint_name, \
            k.TABLE_NAME AS table_name, \
            k.COLUMN_NAME AS column_name, \
            k.REFERENCED_TABLE_NAME AS referenced_table_name, \
            k.REFERENCED_COLUMN_NAME AS referenced_column_name, \
            r.UPDATE_RULE AS update_referential_action_desc, \
            r.DELETE_RULE AS delete_referential_action_desc \
     FROM information_schema.KEY_COLUMN_USAGE k \
     JOIN information_schema.REFERENTIAL_CONSTRAINTS r \
       ON r.CONSTRAINT_SCHEMA = k.CONSTRAINT_SCHEMA \
      AND r.CONSTRAINT_NAME = k.CONSTRAINT_NAME \
     WHERE k.TABLE_SCHEMA = ? AND k.TABLE_NAME = ? \
     ORDER BY k.CONSTRAINT_NAME, k.ORDINAL_POSITION";

const MYSQL_INDEXES: &str = "SELECT INDEX_NAME AS index_name, \
            MAX(INDEX_TYPE) AS type_desc, \
            MIN(NON_UNIQUE) = 0 AS is_unique, \
            INDEX_NAME = 'PRIMARY' AS is_primary_key, \
            GROUP_CONCAT(COLUMN_NAME ORDER BY SEQ_IN_INDEX SEPARATOR ', ') AS column_names \
     FROM information_schema.STATISTICS \
     WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? \
     GROUP BY INDEX_NAME \
     ORDER BY INDEX_NAME";

const MYSQL_CHECK_CONSTRAINTS: &str = "SELECT tc.CONSTRAINT_NAME AS constraint_name, \
            'CHECK_CONSTRAINT' AS type_desc, \
            tc.ENFORCED = 'YES' AS is_enabled, \
            tc.TABLE_NAME AS table_name, \
            cc.CHECK_CLAUSE AS definition \
     FROM information_schema.TABLE_CONSTRAINTS tc \
     JOIN information_schema.CHECK_CONSTRAINTS cc \
       ON cc.CONSTRAINT_SCHEMA = tc.CONSTRAINT_SCHEMA \
      AND cc.CONSTRAINT_NAME = tc.CONSTRAINT_NAME \
     WHERE tc.CONSTRAINT_TYPE = 'CHECK' AND tc.TABLE_SCHEMA = ? AND tc.TABLE_NAME = ? \
     ORDER BY tc.CONSTRAINT_NAME";

// MariaDB's TABLE_CONSTRAINTS has no ENFORCED column.
const MARIADB_CHECK_CONSTRAINTS: &str = "SELECT CONSTRAINT_NAME AS constraint_name, \
            'CHECK_CONSTRAINT' AS type_desc, \
            1 AS is_enabled, \
            TABLE_NAME AS table_name, \
            CHECK_CLAUSE AS definition \
     FROM information_schema.CHECK_CONSTRAINTS \
     WHERE CONSTRAINT_SCHEMA = ? AND TABLE_NAME = ? \
     ORDER BY CONSTRAINT_NAME";

const MYSQL_TRIGGERS: &str = "SELECT TRIGGER_NAME AS trigger_name, \
            ACTION_TIMING AS action_timing, \
            EVENT_MANIPULATION AS event_manipulation, \
            ACTION_STATEMENT AS trigger_definition \
     FROM information_schema.TRIGGERS \
     WHERE EVENT_OBJECT_SCHEMA = ? AND EVENT_OBJECT_TABLE = ? \
     ORDER BY TRIGGER_NAME";

const MYSQL_PROCEDURES: &str = "SELECT ROUTINE_NAME AS procedure_name, \
            ROUTINE_TYPE AS type_desc, \
            ROUTINE_DEFINITION AS procedure_definition, \
            CAST(CREATED AS CHAR) AS create_date, \
            CAST(LAST_ALTERED AS CHAR) AS modify_date \
     FROM information_schema.ROUTINES \
     WHERE ROUTINE_SCHEMA = DATABASE() \
     ORDER BY ROUTINE_NAME";

fn mysql_objects_sql(category: Category, check_constraints: &'static str) -> Option<&'static str> {
    match category {
        Category::Fields => Some(MYSQL_COLUMNS),
        Category::PrimaryKeys => Some(MYSQL_PRIMARY_KEYS),
        Category::ForeignKeys => Some(MYSQL_FOREIGN_KEYS),
        Category::Indexes => Some(MYSQL_INDEXES),
        Category::Constraints => Some(check_constraints),
        Category::Triggers => Some(MYSQL_TRIGGERS),
        _ => None,
    }
}

pub struct MysqlDialect;

impl CatalogDialect for MysqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn database_info_sql(&self) -> &'static str {
        MYSQL_DATABASE_INFO
    }

    fn tables_sql(&self) -> &'static str {
        MYSQL_TABLES
    }

    fn objects_sql(&self, category: Category) -> Option<&'static str> {
        mysql_objects_sql(category, MYSQL_CHECK_CONSTRAINTS)
    }

    fn procedures_sql(&self) -> Option<&'static str> {
        Some(MYSQL_PROCEDURES)
    }
}

// MariaDB shares MySQL's wire protocol and most of its catalog.
pub struct MariadbDialect;

impl CatalogDialect for MariadbDialect {
    fn name(&self) -> &'static str {
        "mariadb"
    }

    fn database_info_sql(&self) -> &'static str {
        MYSQL_DATABASE_INFO
    }

    fn tables_sql(&self) -> &'static str {
        MYSQL_TABLES
    }

    fn objects_sql(&self, category: Category) -> Option<&'static str> {
        mysql_objects_sql(category, MARIADB_CHECK_CONSTRAINTS)
    }

    fn procedures_sql(&self) -> Option<&'static str> {
        Some(MYSQL_PROCEDURES)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SQLite
// ─────────────────────────────────────────────────────────────────────────────

pub struct SqliteDialect;

impl CatalogDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn binds_schema(&self) -> bool {
        // SQLite has no schema namespace
        false
    }

    fn database_info_sql(&self) -> &'static str {
        "SELECT 'main' AS name, sqlite_version() AS compatibility_level"
    }

    fn tables_sql(&self) -> &'static str {
        "SELECT 'main' AS schema_name, name AS table_name \
         FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
         ORDER BY name"
    }

    fn objects_sql(&self, category: Category) -> Option<&'static str> {
        let sql = match category {
            Category::Fields => {
                "SELECT name AS column_name, \
                        type AS data_type, \
                        \"notnull\" = 0 AS is_nullable, \
                        cid + 1 AS column_id, \
                        dflt_value AS default_value \
                 FROM pragma_table_info(?) \
                 ORDER BY cid"
            }
            Category::PrimaryKeys => {
                "SELECT name AS column_name, 'PRIMARY' AS index_name \
                 FROM pragma_table_info(?) \
                 WHERE pk > 0 \
                 ORDER BY pk"
            }
            Category::ForeignKeys => {
                "SELECT 'fk_' || id AS constraint_name, \
                        \"from\" AS column_name, \
                        \"table\" AS referenced_table_name, \
                        \"to\" AS referenced_column_name, \
                        on_update AS update_referential_action_desc, \
                        on_delete AS delete_referential_action_desc \
                 FROM pragma_foreign_key_list(?) \
                 ORDER BY id, seq"
            }
            Category::Indexes => {
                "SELECT il.name AS index_name, \
                        il.origin AS type_desc, \
                        il.\"unique\" AS is_unique, \
                        il.origin = 'pk' AS is_primary_key, \
                        il.origin = 'u' AS is_unique_constraint, \
                        (SELECT group_concat(ii.name, ', ') \
                         FROM pragma_index_info(il.name) ii) AS column_names \
                 FROM pragma_index_list(?) il \
                 ORDER BY il.name"
            }
            Category::Triggers => {
                "SELECT name AS trigger_name, sql AS trigger_definition \
                 FROM sqlite_master \
                 WHERE type = 'trigger' AND tbl_name = ? \
                 ORDER BY name"
            }
            _ => return None,
        };
        Some(sql)
    }

    fn procedures_sql(&self) -> Option<&'static str> {
        None
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Factory
// ─────────────────────────────────────────────────────────────────────────────

/// Resolve the dialect from a driver name string.
pub fn from_driver(driver: &str) -> Box<dyn CatalogDialect> {
    match driver {
        "mysql" => Box::new(MysqlDialect),
        "mariadb" => Box::new(MariadbDialect),
        "sqlite" => Box::new(SqliteDialect),
        _ => Box::new(PostgresDialect),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
