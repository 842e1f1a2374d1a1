#[cfg(test)]
mod tests {
    use crate::flavor::Flavor;
    use crate::insert::{InsertBuilder, insert_into};
    use crate::modifiers::{Arg, Builder, raw};
    use pretty_assertions::assert_eq;

    #[test]
    fn insert_multi_rows() {
        let mut ib = insert_into("demo.user");
        ib.columns(["id", "name", "status"])
            .values((1_i64, "Huan Du", 1_i64))
            .values((2_i64, "Charmy Liu", 1_i64));

        let (sql, args) = ib.build_with_flavor(Flavor::MySQL, &[]).unwrap();
        assert_eq!(
            sql,
            "INSERT INTO `demo.user` (`id`, `name`, `status`) VALUES (?, ?, ?), (?, ?, ?)"
        );
        assert_eq!(args.len(), 6);
        assert_eq!(args[1], Arg::from("Huan Du"));
    }

    #[test]
    fn insert_postgres_placeholders_and_returning() {
        let mut ib = InsertBuilder::new();
        ib.insert_into("t")
            .columns(["id", "value"])
            .values((1_i64, "v1"))
            .returning("id");

        let (sql, _) = ib.build_with_flavor(Flavor::PostgreSQL, &[]).unwrap();
        assert_eq!(
            sql,
            "INSERT INTO \"t\" (\"id\", \"value\") VALUES ($1, $2) RETURNING \"id\""
        );
        assert_eq!(ib.returning_columns(), ["id".to_string()]);
    }

    #[test]
    fn insert_raw_value_and_after_values() {
        let mut ib = insert_into("t");
        ib.columns(["id", "created_at"])
            .values((1_i64, raw("NOW()")))
            .after_values(raw("ON DUPLICATE KEY UPDATE id = id"));

        let (sql, args) = ib.build_with_flavor(Flavor::MySQL, &[]).unwrap();
        assert_eq!(
            sql,
            "INSERT INTO `t` (`id`, `created_at`) VALUES (?, NOW()) ON DUPLICATE KEY UPDATE id = id"
        );
        assert_eq!(args, vec![Arg::from(1_i64)]);
    }

    #[test]
    fn insert_escapes_dollar_in_identifiers() {
        let mut ib = insert_into("t$1");
        ib.columns("a").values(1_i64);
        let (sql, _) = ib.build_with_flavor(Flavor::SQLite, &[]).unwrap();
        assert_eq!(sql, "INSERT INTO \"t$1\" (\"a\") VALUES (?)");
    }
}
