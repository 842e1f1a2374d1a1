#[cfg(test)]
mod tests {
    use crate::flavor::Flavor;
    use crate::modifiers::{Arg, Builder};
    use crate::select::select;
    use crate::union::{union, union_all};
    use pretty_assertions::assert_eq;

    fn members() -> (crate::select::SelectBuilder, crate::select::SelectBuilder) {
        let mut a = select("id");
        a.from("t1").where_("id > ?", 1_i64);
        let mut b = select("id");
        b.from("t2").where_("id < ?", 9_i64);
        (a, b)
    }

    #[test]
    fn union_parenthesizes_members() {
        let (a, b) = members();
        let mut ub = union((a, b));
        ub.order_by("id").limit(5);

        let (sql, args) = ub.build_with_flavor(Flavor::MySQL, &[]).unwrap();
        assert_eq!(
            sql,
            "(SELECT id FROM t1 WHERE (id > ?)) UNION (SELECT id FROM t2 WHERE (id < ?)) ORDER BY id LIMIT ?"
        );
        assert_eq!(
            args,
            vec![Arg::from(1_i64), Arg::from(9_i64), Arg::from(5_i64)]
        );
    }

    #[test]
    fn union_all_on_sqlite_has_no_parens() {
        let (a, b) = members();
        let ub = union_all((a, b));
        let (sql, _) = ub.build_with_flavor(Flavor::SQLite, &[]).unwrap();
        assert_eq!(
            sql,
            "SELECT id FROM t1 WHERE (id > ?) UNION ALL SELECT id FROM t2 WHERE (id < ?)"
        );
    }

    #[test]
    fn union_postgres_numbering() {
        let (a, b) = members();
        let mut ub = union_all(vec![a, b]);
        ub.offset(3);
        let (sql, _) = ub.build_with_flavor(Flavor::PostgreSQL, &[]).unwrap();
        assert_eq!(
            sql,
            "(SELECT id FROM t1 WHERE (id > $1)) UNION ALL (SELECT id FROM t2 WHERE (id < $2)) OFFSET $3"
        );
    }
}
