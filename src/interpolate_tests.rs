#[cfg(test)]
mod tests {
    use crate::error::InterpolateError;
    use crate::flavor::Flavor;
    use crate::interpolate::interpolate;
    use crate::modifiers::{Arg, raw};
    use crate::value::SqlValue;
    use pretty_assertions::assert_eq;
    use time::macros::datetime;

    #[test]
    fn mysql_interpolate_question_marks() {
        let sql = "SELECT * FROM a WHERE name = ? AND state IN (?, ?) AND note = '?'";
        let args = vec![
            Arg::Value(SqlValue::from("I'm fine")),
            Arg::Value(SqlValue::I64(42)),
            Arg::Value(SqlValue::I64(8)),
        ];
        let q = interpolate(&Flavor::MySQL, sql, &args).unwrap();
        assert_eq!(
            q,
            "SELECT * FROM a WHERE name = 'I\\'m fine' AND state IN (42, 8) AND note = '?'"
        );
    }

    #[test]
    fn sqlite_interpolate_doubles_quotes() {
        let args = vec![
            Arg::from(1_i64),
            Arg::from("v_1"),
            Arg::from("it's"),
            Arg::from(true),
            Arg::Value(SqlValue::Null),
        ];
        let q = interpolate(&Flavor::SQLite, "VALUES (?,?,?,?,?)", &args).unwrap();
        assert_eq!(q, "VALUES (1,'v_1','it''s',1,NULL)");
    }

    #[test]
    fn postgres_interpolate_dollar_numbered_and_dollar_quote() {
        let sql = "SELECT $1, $2 FROM $abc$$1$abc$ WHERE x = $2";
        let args = vec![Arg::from(1_i64), Arg::from("hi")];
        let q = interpolate(&Flavor::PostgreSQL, sql, &args).unwrap();
        assert_eq!(q, "SELECT 1, 'hi' FROM $abc$$1$abc$ WHERE x = 'hi'");
    }

    #[test]
    fn sqlserver_interpolate_at_pn() {
        let sql = "SELECT * FROM a WHERE name = @p1 AND id = @P2";
        let args = vec![Arg::from("x"), Arg::from(7_i64)];
        let q = interpolate(&Flavor::SQLServer, sql, &args).unwrap();
        assert_eq!(q, "SELECT * FROM a WHERE name = N'x' AND id = 7");
    }

    #[test]
    fn bytes_and_bools_per_flavor() {
        let args = vec![Arg::from(vec![0xDE_u8, 0xAD]), Arg::from(false)];
        assert_eq!(
            interpolate(&Flavor::SQLite, "? ?", &args).unwrap(),
            "X'DEAD' 0"
        );
        assert_eq!(
            interpolate(&Flavor::PostgreSQL, "$1 $2", &args).unwrap(),
            "'\\xDEAD'::bytea FALSE"
        );
    }

    #[test]
    fn datetime_rounds_to_microseconds_in_utc() {
        let dt = datetime!(2019-04-24 12:23:34.123456789 +08:00);
        let args = vec![Arg::from(dt)];
        let q = interpolate(&Flavor::MySQL, "SELECT ?", &args).unwrap();
        assert_eq!(q, "SELECT '2019-04-24 04:23:34.123457'");
    }

    #[test]
    fn missing_and_unsupported_args() {
        assert_eq!(
            interpolate(&Flavor::MySQL, "? ?", &[Arg::from(1_i64)]).unwrap_err(),
            InterpolateError::MissingArgs
        );
        assert_eq!(
            interpolate(&Flavor::PostgreSQL, "$2", &[Arg::from(1_i64)]).unwrap_err(),
            InterpolateError::MissingArgs
        );
        assert_eq!(
            interpolate(&Flavor::MySQL, "?", &[raw("x")]).unwrap_err(),
            InterpolateError::UnsupportedArgs
        );
    }
}
