use anyhow::{anyhow, Result};
use sqlx::{migrate::MigrateDatabase, Row, Sqlite, SqlitePool};
use std::sync::Arc;

use shared::{Family, FamilyWithUnit, Gender, Member, Payment, RecentFamily, Relationship, Unit};

/// DbConnection manages all database operations for the parish ledger.
///
/// Constructed explicitly and handed to the domain services; no module-level
/// connection singletons.
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Create a new database connection
    pub async fn new(url: &str) -> Result<Self> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url).await?
        }

        let pool = SqlitePool::connect(url).await?;

        Self::setup_schema(&pool).await?;

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Initialize a test database with a unique name
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        let test_id = uuid::Uuid::new_v4().to_string();
        let db_url = format!("file:memdb_{}?mode=memory&cache=shared", test_id);

        Self::new(&db_url).await
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS units (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL DEFAULT '',
                family_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS families (
                id TEXT PRIMARY KEY,
                unit_id TEXT NOT NULL REFERENCES units(id),
                card_no TEXT NOT NULL UNIQUE,
                head_name TEXT NOT NULL,
                address TEXT NOT NULL DEFAULT '',
                phone TEXT NOT NULL DEFAULT '',
                email TEXT,
                pincode TEXT NOT NULL DEFAULT '',
                member_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS members (
                id TEXT PRIMARY KEY,
                family_id TEXT NOT NULL REFERENCES families(id),
                name TEXT NOT NULL COLLATE NOCASE,
                dob TEXT,
                gender TEXT NOT NULL,
                relationship TEXT NOT NULL,
                baptism_date TEXT,
                communion_date TEXT,
                confirmation_date TEXT,
                marriage_date TEXT,
                education TEXT,
                occupation TEXT,
                remarks TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(family_id, name)
            );
            "#,
        )
        .execute(pool)
        .await?;

        // One payment per family per month, enforced at the store
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS payments (
                id TEXT PRIMARY KEY,
                family_id TEXT NOT NULL REFERENCES families(id),
                month TEXT NOT NULL,
                amount_paid INTEGER NOT NULL,
                payment_date TEXT NOT NULL,
                remarks TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(family_id, month)
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_families_unit ON families(unit_id);")
            .execute(pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_members_family ON members(family_id);")
            .execute(pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_payments_month ON payments(month);")
            .execute(pool)
            .await?;

        Ok(())
    }

    // ---- Units ----

    pub async fn store_unit(&self, unit: &Unit) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO units (id, name, description, family_count, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&unit.id)
        .bind(&unit.name)
        .bind(&unit.description)
        .bind(unit.family_count)
        .bind(&unit.created_at)
        .bind(&unit.updated_at)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_unit(&self, unit_id: &str) -> Result<Option<Unit>> {
        let row = sqlx::query("SELECT * FROM units WHERE id = ?")
            .bind(unit_id)
            .fetch_optional(&*self.pool)
            .await?;
        Ok(row.map(|r| row_to_unit(&r)))
    }

    /// All units ordered by name
    pub async fn list_units(&self) -> Result<Vec<Unit>> {
        let rows = sqlx::query("SELECT * FROM units ORDER BY name ASC")
            .fetch_all(&*self.pool)
            .await?;
        Ok(rows.iter().map(row_to_unit).collect())
    }

    pub async fn update_unit(&self, unit: &Unit) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE units SET name = ?, description = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&unit.name)
        .bind(&unit.description)
        .bind(&unit.updated_at)
        .bind(&unit.id)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete_unit(&self, unit_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM units WHERE id = ?")
            .bind(unit_id)
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn adjust_unit_family_count(&self, unit_id: &str, delta: i64) -> Result<()> {
        sqlx::query("UPDATE units SET family_count = family_count + ? WHERE id = ?")
            .bind(delta)
            .bind(unit_id)
            .execute(&*self.pool)
            .await?;
        Ok(())
    }

    pub async fn count_units(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM units")
            .fetch_one(&*self.pool)
            .await?;
        Ok(row.get("n"))
    }

    pub async fn count_families_in_unit(&self, unit_id: &str) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM families WHERE unit_id = ?")
            .bind(unit_id)
            .fetch_one(&*self.pool)
            .await?;
        Ok(row.get("n"))
    }

    // ---- Families ----

    pub async fn store_family(&self, family: &Family) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO families
                (id, unit_id, card_no, head_name, address, phone, email, pincode,
                 member_count, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&family.id)
        .bind(&family.unit_id)
        .bind(&family.card_no)
        .bind(&family.head_name)
        .bind(&family.address)
        .bind(&family.phone)
        .bind(&family.email)
        .bind(&family.pincode)
        .bind(family.member_count)
        .bind(&family.created_at)
        .bind(&family.updated_at)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_family(&self, family_id: &str) -> Result<Option<Family>> {
        let row = sqlx::query("SELECT * FROM families WHERE id = ?")
            .bind(family_id)
            .fetch_optional(&*self.pool)
            .await?;
        Ok(row.map(|r| row_to_family(&r)))
    }

    pub async fn get_family_with_unit(&self, family_id: &str) -> Result<Option<FamilyWithUnit>> {
        let row = sqlx::query(
            r#"
            SELECT f.*, u.name AS unit_name
            FROM families f JOIN units u ON u.id = f.unit_id
            WHERE f.id = ?
            "#,
        )
        .bind(family_id)
        .fetch_optional(&*self.pool)
        .await?;
        Ok(row.map(|r| row_to_family_with_unit(&r)))
    }

    /// Paginated family listing with optional unit filter and
    /// case-insensitive search over head name, card number and address.
    /// Empty-string filters are treated as absent.
    pub async fn list_families(
        &self,
        unit_id: &str,
        search_pattern: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FamilyWithUnit>> {
        let rows = sqlx::query(
            r#"
            SELECT f.*, u.name AS unit_name
            FROM families f JOIN units u ON u.id = f.unit_id
            WHERE (?1 = '' OR f.unit_id = ?1)
              AND (?2 = '' OR f.head_name LIKE ?2 OR f.card_no LIKE ?2 OR f.address LIKE ?2)
            ORDER BY f.head_name ASC
            LIMIT ?3 OFFSET ?4
            "#,
        )
        .bind(unit_id)
        .bind(search_pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&*self.pool)
        .await?;
        Ok(rows.iter().map(row_to_family_with_unit).collect())
    }

    pub async fn count_families_filtered(&self, unit_id: &str, search_pattern: &str) -> Result<i64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS n
            FROM families f
            WHERE (?1 = '' OR f.unit_id = ?1)
              AND (?2 = '' OR f.head_name LIKE ?2 OR f.card_no LIKE ?2 OR f.address LIKE ?2)
            "#,
        )
        .bind(unit_id)
        .bind(search_pattern)
        .fetch_one(&*self.pool)
        .await?;
        Ok(row.get("n"))
    }

    /// All families (optionally restricted to a unit) ordered by head name,
    /// for the cross-family monthly report
    pub async fn list_families_for_report(&self, unit_id: &str) -> Result<Vec<FamilyWithUnit>> {
        let rows = sqlx::query(
            r#"
            SELECT f.*, u.name AS unit_name
            FROM families f JOIN units u ON u.id = f.unit_id
            WHERE (?1 = '' OR f.unit_id = ?1)
            ORDER BY f.head_name ASC
            "#,
        )
        .bind(unit_id)
        .fetch_all(&*self.pool)
        .await?;
        Ok(rows.iter().map(row_to_family_with_unit).collect())
    }

    pub async fn update_family(&self, family: &Family) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE families SET
                unit_id = ?, card_no = ?, head_name = ?, address = ?, phone = ?,
                email = ?, pincode = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&family.unit_id)
        .bind(&family.card_no)
        .bind(&family.head_name)
        .bind(&family.address)
        .bind(&family.phone)
        .bind(&family.email)
        .bind(&family.pincode)
        .bind(&family.updated_at)
        .bind(&family.id)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete_family(&self, family_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM families WHERE id = ?")
            .bind(family_id)
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_family_member_count(&self, family_id: &str, count: i64) -> Result<()> {
        sqlx::query("UPDATE families SET member_count = ? WHERE id = ?")
            .bind(count)
            .bind(family_id)
            .execute(&*self.pool)
            .await?;
        Ok(())
    }

    pub async fn count_families(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM families")
            .fetch_one(&*self.pool)
            .await?;
        Ok(row.get("n"))
    }

    /// Most recently registered families with their unit names
    pub async fn recent_families(&self, limit: i64) -> Result<Vec<RecentFamily>> {
        let rows = sqlx::query(
            r#"
            SELECT f.id, f.head_name, u.name AS unit_name, f.member_count, f.created_at
            FROM families f JOIN units u ON u.id = f.unit_id
            ORDER BY f.created_at DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&*self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(|r| RecentFamily {
                id: r.get("id"),
                head_name: r.get("head_name"),
                unit_name: r.get("unit_name"),
                member_count: r.get("member_count"),
                created_at: r.get("created_at"),
            })
            .collect())
    }

    // ---- Members ----

    pub async fn store_member(&self, member: &Member) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO members
                (id, family_id, name, dob, gender, relationship, baptism_date,
                 communion_date, confirmation_date, marriage_date, education,
                 occupation, remarks, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&member.id)
        .bind(&member.family_id)
        .bind(&member.name)
        .bind(&member.dob)
        .bind(member.gender.as_str())
        .bind(member.relationship.as_str())
        .bind(&member.baptism_date)
        .bind(&member.communion_date)
        .bind(&member.confirmation_date)
        .bind(&member.marriage_date)
        .bind(&member.education)
        .bind(&member.occupation)
        .bind(&member.remarks)
        .bind(&member.created_at)
        .bind(&member.updated_at)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_member(&self, family_id: &str, member_id: &str) -> Result<Option<Member>> {
        let row = sqlx::query("SELECT * FROM members WHERE id = ? AND family_id = ?")
            .bind(member_id)
            .bind(family_id)
            .fetch_optional(&*self.pool)
            .await?;
        row.map(|r| row_to_member(&r)).transpose()
    }

    /// Members of a family in registration order
    pub async fn list_members(&self, family_id: &str) -> Result<Vec<Member>> {
        let rows = sqlx::query("SELECT * FROM members WHERE family_id = ? ORDER BY created_at ASC")
            .bind(family_id)
            .fetch_all(&*self.pool)
            .await?;
        rows.iter().map(row_to_member).collect()
    }

    pub async fn update_member(&self, member: &Member) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE members SET
                name = ?, dob = ?, gender = ?, relationship = ?, baptism_date = ?,
                communion_date = ?, confirmation_date = ?, marriage_date = ?,
                education = ?, occupation = ?, remarks = ?, updated_at = ?
            WHERE id = ? AND family_id = ?
            "#,
        )
        .bind(&member.name)
        .bind(&member.dob)
        .bind(member.gender.as_str())
        .bind(member.relationship.as_str())
        .bind(&member.baptism_date)
        .bind(&member.communion_date)
        .bind(&member.confirmation_date)
        .bind(&member.marriage_date)
        .bind(&member.education)
        .bind(&member.occupation)
        .bind(&member.remarks)
        .bind(&member.updated_at)
        .bind(&member.id)
        .bind(&member.family_id)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete_member(&self, family_id: &str, member_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM members WHERE id = ? AND family_id = ?")
            .bind(member_id)
            .bind(family_id)
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_members_for_family(&self, family_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM members WHERE family_id = ?")
            .bind(family_id)
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn count_members(&self, family_id: &str) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM members WHERE family_id = ?")
            .bind(family_id)
            .fetch_one(&*self.pool)
            .await?;
        Ok(row.get("n"))
    }

    pub async fn count_all_members(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM members")
            .fetch_one(&*self.pool)
            .await?;
        Ok(row.get("n"))
    }

    // ---- Payments ----

    /// Atomic per-(family, month) upsert. An existing record for the same
    /// family and month keeps its id and created_at; amount, payment date,
    /// remarks and updated_at are overwritten. Returns the stored row.
    pub async fn upsert_payment(&self, payment: &Payment) -> Result<Payment> {
        sqlx::query(
            r#"
            INSERT INTO payments
                (id, family_id, month, amount_paid, payment_date, remarks, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(family_id, month) DO UPDATE SET
                amount_paid = excluded.amount_paid,
                payment_date = excluded.payment_date,
                remarks = excluded.remarks,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.family_id)
        .bind(&payment.month)
        .bind(payment.amount_paid)
        .bind(&payment.payment_date)
        .bind(&payment.remarks)
        .bind(&payment.created_at)
        .bind(&payment.updated_at)
        .execute(&*self.pool)
        .await?;

        self.get_payment_by_month(&payment.family_id, &payment.month)
            .await?
            .ok_or_else(|| anyhow!("payment missing immediately after upsert"))
    }

    pub async fn get_payment(&self, family_id: &str, payment_id: &str) -> Result<Option<Payment>> {
        let row = sqlx::query("SELECT * FROM payments WHERE id = ? AND family_id = ?")
            .bind(payment_id)
            .bind(family_id)
            .fetch_optional(&*self.pool)
            .await?;
        Ok(row.map(|r| row_to_payment(&r)))
    }

    pub async fn get_payment_by_month(&self, family_id: &str, month: &str) -> Result<Option<Payment>> {
        let row = sqlx::query("SELECT * FROM payments WHERE family_id = ? AND month = ?")
            .bind(family_id)
            .bind(month)
            .fetch_optional(&*self.pool)
            .await?;
        Ok(row.map(|r| row_to_payment(&r)))
    }

    /// All payments for a family, most recent month first
    pub async fn list_payments(&self, family_id: &str) -> Result<Vec<Payment>> {
        let rows = sqlx::query("SELECT * FROM payments WHERE family_id = ? ORDER BY month DESC")
            .bind(family_id)
            .fetch_all(&*self.pool)
            .await?;
        Ok(rows.iter().map(row_to_payment).collect())
    }

    pub async fn list_payments_for_month(&self, month: &str) -> Result<Vec<Payment>> {
        let rows = sqlx::query("SELECT * FROM payments WHERE month = ?")
            .bind(month)
            .fetch_all(&*self.pool)
            .await?;
        Ok(rows.iter().map(row_to_payment).collect())
    }

    pub async fn update_payment(&self, payment: &Payment) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE payments SET amount_paid = ?, payment_date = ?, remarks = ?, updated_at = ?
            WHERE id = ? AND family_id = ?
            "#,
        )
        .bind(payment.amount_paid)
        .bind(&payment.payment_date)
        .bind(&payment.remarks)
        .bind(&payment.updated_at)
        .bind(&payment.id)
        .bind(&payment.family_id)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete_payment(&self, family_id: &str, payment_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM payments WHERE id = ? AND family_id = ?")
            .bind(payment_id)
            .bind(family_id)
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_payments_for_family(&self, family_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM payments WHERE family_id = ?")
            .bind(family_id)
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn row_to_unit(row: &sqlx::sqlite::SqliteRow) -> Unit {
    Unit {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        family_count: row.get("family_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_family(row: &sqlx::sqlite::SqliteRow) -> Family {
    Family {
        id: row.get("id"),
        unit_id: row.get("unit_id"),
        card_no: row.get("card_no"),
        head_name: row.get("head_name"),
        address: row.get("address"),
        phone: row.get("phone"),
        email: row.get("email"),
        pincode: row.get("pincode"),
        member_count: row.get("member_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_family_with_unit(row: &sqlx::sqlite::SqliteRow) -> FamilyWithUnit {
    FamilyWithUnit {
        family: row_to_family(row),
        unit_name: row.get("unit_name"),
    }
}

fn row_to_member(row: &sqlx::sqlite::SqliteRow) -> Result<Member> {
    let gender_str: String = row.get("gender");
    let relationship_str: String = row.get("relationship");
    Ok(Member {
        id: row.get("id"),
        family_id: row.get("family_id"),
        name: row.get("name"),
        dob: row.get("dob"),
        gender: Gender::parse(&gender_str)
            .ok_or_else(|| anyhow!("unrecognized gender in store: {gender_str}"))?,
        relationship: Relationship::parse(&relationship_str)
            .ok_or_else(|| anyhow!("unrecognized relationship in store: {relationship_str}"))?,
        baptism_date: row.get("baptism_date"),
        communion_date: row.get("communion_date"),
        confirmation_date: row.get("confirmation_date"),
        marriage_date: row.get("marriage_date"),
        education: row.get("education"),
        occupation: row.get("occupation"),
        remarks: row.get("remarks"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_payment(row: &sqlx::sqlite::SqliteRow) -> Payment {
    Payment {
        id: row.get("id"),
        family_id: row.get("family_id"),
        month: row.get("month"),
        amount_paid: row.get("amount_paid"),
        payment_date: row.get("payment_date"),
        remarks: row.get("remarks"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
