use rusqlite::{OptionalExtension, Row, params};

use super::{StoreError, StoreTx, json_column};
use crate::models::courier::{Courier, CourierId};

fn courier_from_row(row: &Row<'_>) -> rusqlite::Result<Courier> {
    Ok(Courier {
        courier_id: row.get(0)?,
        courier_type: row.get(1)?,
        regions: json_column(row, 2)?,
        working_hours: json_column(row, 3)?,
    })
}

impl StoreTx<'_> {
    pub fn load_courier(&self, courier_id: CourierId) -> Result<Option<Courier>, StoreError> {
        let courier = self
            .tx
            .query_row(
                "SELECT courier_id, courier_type, regions, working_hours
                 FROM couriers WHERE courier_id = ?1",
                params![courier_id],
                courier_from_row,
            )
            .optional()?;
        Ok(courier)
    }

    pub fn save_courier(&self, courier: &Courier) -> Result<(), StoreError> {
        self.tx.execute(
            "UPDATE couriers SET courier_type = ?2, regions = ?3, working_hours = ?4
             WHERE courier_id = ?1",
            params![
                courier.courier_id,
                courier.courier_type,
                serde_json::to_string(&courier.regions)?,
                serde_json::to_string(&courier.working_hours)?,
            ],
        )?;
        Ok(())
    }

    pub fn insert_couriers(&self, couriers: &[Courier]) -> Result<(), StoreError> {
        let mut stmt = self.tx.prepare_cached(
            "INSERT INTO couriers (courier_id, courier_type, regions, working_hours)
             VALUES (?1, ?2, ?3, ?4)",
        )?;

        for courier in couriers {
            stmt.execute(params![
                courier.courier_id,
                courier.courier_type,
                serde_json::to_string(&courier.regions)?,
                serde_json::to_string(&courier.working_hours)?,
            ])?;
        }
        Ok(())
    }

    /// Subset of `ids` already stored.
    pub fn existing_courier_ids(&self, ids: &[CourierId]) -> Result<Vec<CourierId>, StoreError> {
        let mut stmt = self.tx.prepare_cached(
            "SELECT courier_id FROM couriers
             WHERE courier_id IN (SELECT value FROM json_each(?1))
             ORDER BY courier_id",
        )?;
        let existing = stmt
            .query_map(params![serde_json::to_string(ids)?], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(existing)
    }
}
