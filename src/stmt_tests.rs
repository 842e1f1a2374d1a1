#[cfg(test)]
mod tests {
    use crate::dialect::{TimeLayout, TimeLayoutDialect};
    use crate::error::DbError;
    use crate::flavor::Flavor;
    use crate::fragment::{Parens, do_nothing, do_update, values};
    use crate::modifiers::raw;
    use crate::scan::Rows;
    use crate::select::select;
    use crate::session::{Dml, Session};
    use crate::test_support::MockConnection;
    use crate::value::SqlValue;
    use pretty_assertions::assert_eq;

    fn session(flavor: Flavor) -> (Session, MockConnection) {
        let conn = MockConnection::new();
        let s = Session::builder(conn.clone()).dialect(flavor).build();
        (s, conn)
    }

    #[test]
    fn insert_on_conflict_do_update() {
        let (s, conn) = session(Flavor::PostgreSQL);
        let mut ins = s.insert_into("t");
        ins.columns(["id", "value"])
            .values((1_i64, "a"))
            .on_conflict("id", do_update().set("value", raw("excluded.value")));

        let expected = "INSERT INTO \"t\" (\"id\", \"value\") VALUES (1, 'a') ON CONFLICT (\"id\") DO UPDATE SET \"value\" = excluded.value";
        assert_eq!(ins.to_sql().unwrap(), expected);

        ins.exec().unwrap();
        let stmts = conn.recorder.statements.borrow();
        assert_eq!(stmts.len(), 1);
        assert_eq!(stmts[0].0, expected);
        assert!(stmts[0].1.is_empty());
    }

    #[test]
    fn insert_on_conflict_do_nothing_without_target() {
        let (s, _conn) = session(Flavor::SQLite);
        let mut ins = s.insert_into("t");
        ins.columns(["id", "value"])
            .values((1_i64, "it's"))
            .on_conflict(Vec::<String>::new(), do_nothing());

        assert_eq!(
            ins.to_sql().unwrap(),
            "INSERT INTO \"t\" (\"id\", \"value\") VALUES (1, 'it''s') ON CONFLICT DO NOTHING"
        );
    }

    #[test]
    fn on_conflict_target_quoted_by_session_dialect() {
        let conn = MockConnection::new();
        let s = Session::builder(conn)
            .dialect(TimeLayoutDialect::new(Flavor::MySQL, TimeLayout::Rfc3339))
            .build();
        let mut ins = s.insert_into("t");
        ins.columns(["id", "k"])
            .values((1_i64, "a"))
            .on_conflict(["id", "k"], do_nothing());

        assert_eq!(
            ins.to_sql().unwrap(),
            "INSERT INTO `t` (`id`, `k`) VALUES (1, 'a') ON CONFLICT (`id`, `k`) DO NOTHING"
        );
    }

    #[test]
    fn returning_ignored_outside_postgres() {
        let (s, _conn) = session(Flavor::MySQL);
        let mut ins = s.insert_into("t");
        ins.columns("value").values("x").returning("id");
        assert_eq!(
            ins.to_sql().unwrap(),
            "INSERT INTO `t` (`value`) VALUES ('x')"
        );

        let mut up = s.update("t");
        up.set("value", "y").where_("id = ?", 1_i64).returning("id");
        assert_eq!(
            up.to_sql().unwrap(),
            "UPDATE `t` SET `value` = 'y' WHERE (id = 1)"
        );
    }

    #[test]
    fn postgres_single_returning_reads_id() {
        let (s, conn) = session(Flavor::PostgreSQL);
        conn.recorder.push_rows(Rows::new(
            vec!["id".to_string()],
            vec![vec![SqlValue::I64(7)]],
        ));

        let mut ins = s.insert_into("t");
        ins.columns("value").values("x").returning("id");
        let res = ins.exec().unwrap();
        assert_eq!(res.last_insert_id, Some(7));
        assert_eq!(res.rows_affected, 0);

        let stmts = conn.recorder.statements.borrow();
        assert_eq!(
            stmts[0].0,
            "INSERT INTO \"t\" (\"value\") VALUES ($1) RETURNING \"id\""
        );
        assert_eq!(stmts[0].1, vec![SqlValue::from("x")]);
    }

    #[test]
    fn postgres_returning_without_rows_has_no_id() {
        let (s, _conn) = session(Flavor::PostgreSQL);
        let mut ins = s.insert_into("t");
        ins.columns("value").values("x").returning("id");
        assert_eq!(ins.exec().unwrap().last_insert_id, None);
    }

    #[test]
    fn with_is_consumed_by_select() {
        let (s, conn) = session(Flavor::PostgreSQL);
        let mut q = s
            .with("v(id,value)", values((1_i64, "v_1")).row((2_i64, "v_2")))
            .select(["v.value", "t.value"]);
        q.from("v").join("t", "t.id = v.id", ());

        assert_eq!(
            q.to_sql().unwrap(),
            "WITH v(id,value) AS (VALUES (1,'v_1'),(2,'v_2')) SELECT v.value, t.value FROM v JOIN t ON t.id = v.id"
        );

        q.rows().unwrap();
        let stmts = conn.recorder.statements.borrow();
        assert_eq!(
            stmts[0].0,
            "WITH v(id,value) AS (VALUES ($1,$2),($3,$4)) SELECT v.value, t.value FROM v JOIN t ON t.id = v.id"
        );
        assert_eq!(stmts[0].1.len(), 4);

        // 已被消费
        assert_eq!(s.select("1").to_sql().unwrap(), "SELECT 1");
    }

    #[test]
    fn update_with_runs_as_literal() {
        let (s, conn) = session(Flavor::SQLite);
        let mut value = select("value");
        value.from("v").where_("v.id = t.id", ());
        let mut ids = select("id");
        ids.from("v");

        let mut up = s
            .with("v(id,value)", values((1_i64, "v_1")).row((2_i64, "v_2")))
            .update("t");
        up.set("value", Parens::new(value)).where_("t.id in ?", ids);
        up.exec().unwrap();

        let stmts = conn.recorder.statements.borrow();
        assert_eq!(
            stmts[0].0,
            "WITH v(id,value) AS (VALUES (1,'v_1'),(2,'v_2')) UPDATE \"t\" SET \"value\" = (SELECT value FROM v WHERE (v.id = t.id)) WHERE (t.id in (SELECT id FROM v))"
        );
        assert!(stmts[0].1.is_empty());
    }

    #[test]
    fn insert_and_delete_discard_pending_with() {
        let (s, _conn) = session(Flavor::MySQL);
        s.with("a", select("1"));
        let _ = s.insert_into("t");
        let mut q = s.select("id");
        q.from("t");
        assert_eq!(q.to_sql().unwrap(), "SELECT id FROM t");

        s.with("a", select("1"));
        let mut del = s.delete_from("t");
        del.where_("id = ?", 3_i64);
        assert_eq!(del.to_sql().unwrap(), "DELETE FROM `t` WHERE (id = 3)");
        assert_eq!(s.select("x").to_sql().unwrap(), "SELECT x");
    }

    #[test]
    fn raw_exec_and_query() {
        let (s, conn) = session(Flavor::PostgreSQL);
        s.exec("UPDATE t SET n = ? WHERE id = ?", (1_i64, 2_i64))
            .unwrap();
        s.query("SELECT n FROM t WHERE id = ?", 2_i64).unwrap();

        let stmts = conn.recorder.statements.borrow();
        assert_eq!(stmts[0].0, "UPDATE t SET n = $1 WHERE id = $2");
        assert_eq!(stmts[0].1, vec![SqlValue::I64(1), SqlValue::I64(2)]);
        assert_eq!(stmts[1].0, "SELECT n FROM t WHERE id = $1");
    }

    #[test]
    fn build_error_never_reaches_driver() {
        let (s, conn) = session(Flavor::MySQL);
        let mut q = s.select("id");
        q.from("t").where_("a = ? AND b = ?", 1_i64);

        let err = q.rows().unwrap_err();
        assert!(err.is_build(), "{err}");
        assert!(matches!(err, DbError::Build(_)));
        assert!(conn.recorder.statements.borrow().is_empty());
    }

    #[test]
    fn load_helpers() {
        let (s, conn) = session(Flavor::SQLite);
        conn.recorder.push_rows(Rows::new(
            vec!["value".to_string()],
            vec![
                vec![SqlValue::from("a")],
                vec![SqlValue::from("b")],
            ],
        ));
        conn.recorder.push_rows(Rows::new(
            vec!["n".to_string()],
            vec![vec![SqlValue::I64(42)]],
        ));

        let mut q = s.select("value");
        q.from("t");
        assert_eq!(q.load_strings().unwrap(), vec!["a", "b"]);

        let mut n = s.select("COUNT(*)");
        n.from("t");
        assert_eq!(n.load_value::<i64>().unwrap(), 42);
    }

    #[test]
    fn union_stmt_runs_interpolated() {
        let (s, conn) = session(Flavor::PostgreSQL);
        let mut a = select("id");
        a.from("t1").where_("id > ?", 1_i64);
        let mut b = select("id");
        b.from("t2");

        let mut u = s.union_all((a, b));
        u.order_by("id").limit(2);
        assert_eq!(
            u.to_sql().unwrap(),
            "(SELECT id FROM t1 WHERE (id > 1)) UNION ALL (SELECT id FROM t2) ORDER BY id LIMIT 2"
        );

        u.rows().unwrap();
        let stmts = conn.recorder.statements.borrow();
        assert_eq!(stmts[0].0, u.to_sql().unwrap());
        assert!(stmts[0].1.is_empty());
    }
}
