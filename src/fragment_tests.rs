#[cfg(test)]
mod tests {
    use crate::error::BuildError;
    use crate::flavor::Flavor;
    use crate::fragment::{
        Literal, Parens, UpdateFragment, Values, do_nothing, do_update, greatest, translate,
        values,
    };
    use crate::modifiers::{Arg, Builder, raw};
    use crate::select::select;
    use pretty_assertions::assert_eq;

    #[test]
    fn parens_wraps_subquery() {
        let mut sb = select("value");
        sb.from("v").where_("v.id = t.id", ());
        let (sql, args) = Parens::new(sb)
            .build_with_flavor(Flavor::SQLite, &[])
            .unwrap();
        assert_eq!(sql, "(SELECT value FROM v WHERE (v.id = t.id))");
        assert!(args.is_empty());
    }

    #[test]
    fn values_rows() {
        let v = values((1_i64, "v_1")).row((2_i64, "v_2"));
        let (sql, args) = v.build_with_flavor(Flavor::PostgreSQL, &[]).unwrap();
        assert_eq!(sql, "VALUES ($1,$2),($3,$4)");
        assert_eq!(
            args,
            vec![
                Arg::from(1_i64),
                Arg::from("v_1"),
                Arg::from(2_i64),
                Arg::from("v_2"),
            ]
        );
    }

    #[test]
    fn values_skips_empty_rows() {
        let v = Values::new().row(()).row((1_i64, 2_i64)).row(Vec::<i64>::new());
        let (sql, _) = v.build_with_flavor(Flavor::MySQL, &[]).unwrap();
        assert_eq!(sql, "VALUES (?,?)");
    }

    #[test]
    fn values_without_rows_is_error() {
        let v = Values::new().row(());
        assert!(v.is_empty());
        assert_eq!(
            v.build_with_flavor(Flavor::MySQL, &[]).unwrap_err(),
            BuildError::EmptyValues
        );
    }

    #[test]
    fn greatest_by_flavor() {
        let g = greatest((1_i64, 2_i64));
        let (sql, args) = g.build_with_flavor(Flavor::MySQL, &[]).unwrap();
        assert_eq!(sql, "max(?,?)");
        assert_eq!(args, vec![Arg::from(1_i64), Arg::from(2_i64)]);

        let (sql, _) = g.build_with_flavor(Flavor::PostgreSQL, &[]).unwrap();
        assert_eq!(sql, "greatest($1,$2)");
    }

    #[test]
    fn greatest_needs_args() {
        assert_eq!(
            greatest(()).build_with_flavor(Flavor::MySQL, &[]).unwrap_err(),
            BuildError::EmptyArgs("greatest")
        );
    }

    #[test]
    fn translate_by_flavor() {
        let t = translate(raw("name"), "ab", "xy");

        let (sql, args) = t.build_with_flavor(Flavor::PostgreSQL, &[]).unwrap();
        assert_eq!(sql, "translate(name, $1, $2)");
        assert_eq!(args, vec![Arg::from("ab"), Arg::from("xy")]);

        let (sql, args) = t.build_with_flavor(Flavor::SQLite, &[]).unwrap();
        assert_eq!(sql, "replace(replace(name, ?, ?), ?, ?)");
        assert_eq!(
            args,
            vec![Arg::from("a"), Arg::from("x"), Arg::from("b"), Arg::from("y")]
        );
    }

    #[test]
    fn translate_length_mismatch() {
        let err = translate(raw("name"), "abc", "x")
            .build_with_flavor(Flavor::MySQL, &[])
            .unwrap_err();
        assert_eq!(err, BuildError::TranslateLength { from: 3, to: 1 });
    }

    #[test]
    fn update_fragment_sorted_columns() {
        let u = UpdateFragment::new()
            .table("t")
            .set("value", "x")
            .set("id", 1_i64)
            .where_("id = ?", 1_i64)
            .where_("value <> ?", "x");
        let (sql, args) = u.build_with_flavor(Flavor::PostgreSQL, &[]).unwrap();
        assert_eq!(
            sql,
            "UPDATE \"t\" SET \"id\" = $1, \"value\" = $2 WHERE (id = $3) AND (value <> $4)"
        );
        assert_eq!(args.len(), 4);
    }

    #[test]
    fn update_fragment_where_count_mismatch() {
        let err = UpdateFragment::new()
            .set("a", 1_i64)
            .where_("a = ? AND b = ?", 1_i64)
            .build_with_flavor(Flavor::MySQL, &[])
            .unwrap_err();
        assert!(matches!(err, BuildError::ArgCountMismatch { .. }));
    }

    #[test]
    fn conflict_actions() {
        let (sql, _) = do_nothing().build_with_flavor(Flavor::PostgreSQL, &[]).unwrap();
        assert_eq!(sql, "NOTHING");

        let (sql, args) = do_update()
            .set("value", raw("excluded.value"))
            .build_with_flavor(Flavor::PostgreSQL, &[])
            .unwrap();
        assert_eq!(sql, "UPDATE SET \"value\" = excluded.value");
        assert!(args.is_empty());
    }

    #[test]
    fn literal_keeps_initial_args() {
        let (sql, args) = Literal::new("NOW()")
            .build_with_flavor(Flavor::MySQL, &[Arg::from(1_i64)])
            .unwrap();
        assert_eq!(sql, "NOW()");
        assert_eq!(args, vec![Arg::from(1_i64)]);
    }
}
